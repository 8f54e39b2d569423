use anyhow::Context;
use chronocore::AnalysisOutcome;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Appends one line describing `outcome` to the report at `path`.
pub fn append_report<P: AsRef<Path>>(
    path: P,
    source: &str,
    outcome: &AnalysisOutcome,
) -> anyhow::Result<()> {
    let path_ref = path.as_ref();
    if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }

    let line = match outcome.reason() {
        None => format!("source={} status=ok {}\n", source, outcome.summary()),
        Some(reason) => format!(
            "source={} status=failed reason={:?} {}\n",
            source,
            reason,
            outcome.summary()
        ),
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path_ref)
        .with_context(|| format!("opening report {}", path_ref.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("writing report {}", path_ref.display()))?;
    Ok(())
}
