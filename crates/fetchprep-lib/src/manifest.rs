use crate::download::TransferRequest;
use crate::error::FetchPrepError;
use crate::verification::ChecksumAlgorithm;
use std::path::Path;
use tracing::warn;
use url::Url;

/// Load a batch manifest: one entry per line, tab-separated.
///
/// ```text
/// # url <TAB> destination [<TAB> algorithm:hexdigest]
/// https://example.com/a.jar    mods/a.jar
/// https://example.com/b.jar    mods/b.jar    sha256:ba7816bf...
/// ```
///
/// Blank lines and `#` comments are skipped. Structurally malformed lines
/// are logged and skipped; an unsupported checksum algorithm fails the
/// whole manifest, before any network I/O.
pub fn load_manifest(path: &Path) -> Result<Vec<TransferRequest>, FetchPrepError> {
    let content =
        std::fs::read_to_string(path).map_err(|err| FetchPrepError::ManifestLoad {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    parse_manifest(&content)
}

pub fn parse_manifest(content: &str) -> Result<Vec<TransferRequest>, FetchPrepError> {
    let mut requests = Vec::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t').map(str::trim);
        let (Some(source), Some(destination)) = (fields.next(), fields.next()) else {
            warn!(line = line_number, "Skipping manifest line without a destination");
            continue;
        };
        if destination.is_empty() {
            warn!(line = line_number, "Skipping manifest line without a destination");
            continue;
        }

        let source = match Url::parse(source) {
            Ok(url) => url,
            Err(err) => {
                warn!(line = line_number, url = source, error = %err, "Skipping manifest line with invalid URL");
                continue;
            }
        };

        let mut request = TransferRequest::new(source, destination);
        if let Some(digest_field) = fields.next().filter(|field| !field.is_empty()) {
            let Some((algorithm, digest)) = digest_field.split_once(':') else {
                warn!(
                    line = line_number,
                    field = digest_field,
                    "Skipping manifest line with malformed digest field (want algorithm:hexdigest)"
                );
                continue;
            };
            let algorithm: ChecksumAlgorithm = algorithm.parse()?;
            request = request.with_digest(algorithm, digest);
        }

        requests.push(request);
    }

    Ok(requests)
}
