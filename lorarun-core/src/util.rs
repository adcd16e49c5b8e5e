//! Contains a collection of useful utility functions.

use std::fs::read;
use std::path::Path;

use crate::error::Error;
use crate::Result;

/// Create a static deser object from given path using serde.
pub fn deser_struct_from_path<T>(file_path: &Path) -> Result<T>
where
    for<'de> T: serde::Deserialize<'de>,
{
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let bytes = read(file_path)?;
    let d: T = match ext.as_str() {
        "toml" => toml::from_slice(&bytes)?,
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yaml::from_slice(&bytes)?,
        _ => {
            return Err(Error::UnsupportedConfigFormat(
                file_path.to_string_lossy().to_string(),
            ))
        }
    };
    Ok(d)
}

/// Joins program and arguments into a single line that can be pasted into
/// a shell.
pub fn shell_join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(|p| shlex::quote(p).into_owned())
        .collect::<Vec<String>>()
        .join(" ")
}

#[test]
fn shell_join_leaves_plain_words() {
    assert_eq!(shell_join(vec!["python", "loraDir.py", "100"]), "python loraDir.py 100");
}

#[test]
fn shell_join_quotes_special_characters() {
    let parts = vec!["python", "it's.py", "$HOME;rm", "a\"b", "my sim.py", ""];
    let line = shell_join(parts.clone());
    assert!(!line.contains(" $HOME;rm"));
    assert_eq!(shlex::split(&line), Some(parts.iter().map(|p| p.to_string()).collect::<Vec<String>>()));
}
