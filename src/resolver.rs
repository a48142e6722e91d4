//! Maps a test file to the program it judges.
//!
//! Resolution is pure path computation; the resulting file is not checked
//! for existence.

use crate::NamingConfig;
use std::path::{Path, PathBuf};

/// Path of the program judged by the test defined in `test_file`
///
/// An explicit `main` in `naming` wins. Otherwise the test file's base name
/// is stripped of the configured test prefix/suffix (or, when none is
/// configured, of a `test` marker), wrapped in the main prefix/suffix and
/// placed next to the test file.
pub fn resolve_main(test_file: &Path, naming: &NamingConfig) -> PathBuf {
    if let Some(main) = &naming.main {
        tracing::debug!(main = %main.display(), "using explicit main program");
        return main.clone();
    }

    let dir = test_file.parent().unwrap_or(Path::new(""));
    let stem = test_file
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();

    let problem = if naming.has_test_affix() {
        strip_test_affix(
            &stem,
            naming.test_prefix.as_deref(),
            naming.test_suffix.as_deref(),
        )
        .to_string()
    } else {
        infer_problem_name(&stem)
    };

    let mut file_name = format!(
        "{}{}{}",
        naming.main_prefix.as_deref().unwrap_or(""),
        problem,
        naming.main_suffix.as_deref().unwrap_or(""),
    );
    let extension = naming
        .main_extension
        .as_deref()
        .map(str::to_owned)
        .or_else(|| {
            test_file
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
        });
    if let Some(extension) = extension {
        file_name.push('.');
        file_name.push_str(&extension);
    }

    let main = dir.join(file_name);
    tracing::debug!(
        test_file = %test_file.display(),
        main = %main.display(),
        "resolved main program"
    );
    main
}

/// Strip `prefix` from the start and then `suffix` from the end, each only if present
pub fn strip_test_affix<'a>(name: &'a str, prefix: Option<&str>, suffix: Option<&str>) -> &'a str {
    let name = prefix
        .and_then(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name);
    suffix
        .and_then(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name)
}

/// Drop the `test` marker from a test file's base name
///
/// The first matching rule wins: leading `test_`, trailing `_test`,
/// trailing `test`, leading `test`, then the first `test` anywhere.
pub fn infer_problem_name(name: &str) -> String {
    if let Some(rest) = name.strip_prefix("test_") {
        rest.to_string()
    } else if let Some(rest) = name.strip_suffix("_test") {
        rest.to_string()
    } else if let Some(rest) = name.strip_suffix("test") {
        rest.to_string()
    } else if let Some(rest) = name.strip_prefix("test") {
        rest.to_string()
    } else {
        name.replacen("test", "", 1)
    }
}
