//! This module provides the `ProgramLoader` struct, responsible for loading machine
//! definitions from various sources, including files, strings and directories.

use crate::analyzer::analyze;
use crate::parser::parse;
use crate::types::{Definition, TuringMachineError, MAX_DEFINITION_SIZE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extensions recognized by `ProgramLoader::load_definitions`.
const EXTENSIONS: [&str; 2] = ["tm", "json"];

/// `ProgramLoader` is a utility struct for loading machine definitions.
/// Files ending in `.json` are decoded with `serde_json`; everything else is parsed as the
/// `.tm` text format.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single definition from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Definition)` if the file is successfully read, decoded and validated.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * `Err(TuringMachineError::ParseError)` or `DecodeError` if the content is not valid.
    pub fn load_definition(path: &Path) -> Result<Definition, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), bytes = content.len(), "loading definition");

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::load_definition_from_json(&content)
        } else {
            Self::load_definition_from_string(&content)
        }
    }

    /// Loads a single definition from `.tm` text.
    ///
    /// This is useful for definitions that are not stored in files, e.g. piped on stdin.
    pub fn load_definition_from_string(content: &str) -> Result<Definition, TuringMachineError> {
        check_size(content)?;
        parse(content)
    }

    /// Loads a single definition from JSON and validates it.
    pub fn load_definition_from_json(content: &str) -> Result<Definition, TuringMachineError> {
        check_size(content)?;

        let definition: Definition = serde_json::from_str(content)
            .map_err(|e| TuringMachineError::DecodeError(e.to_string()))?;
        analyze(&definition)?;

        Ok(definition)
    }

    /// Loads every `.tm` and `.json` definition from a given directory.
    ///
    /// Directories and files with other extensions are skipped. Each element of the result is
    /// either the loaded definition with its path, or the error for one file.
    pub fn load_definitions(
        directory: &Path,
    ) -> Vec<Result<(PathBuf, Definition), TuringMachineError>> {
        if !directory.exists() {
            return vec![Err(TuringMachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(TuringMachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                if path.is_dir()
                    || path
                        .extension()
                        .is_none_or(|ext| !EXTENSIONS.iter().any(|known| ext == *known))
                {
                    return None;
                }

                match Self::load_definition(&path) {
                    Ok(definition) => Some(Ok((path, definition))),
                    Err(e) => Some(Err(TuringMachineError::FileError(format!(
                        "Failed to load definition from {}: {}",
                        path.display(),
                        e
                    )))),
                }
            })
            .collect();

        // read_dir order is platform dependent
        results.sort_by_key(|result| match result {
            Ok((path, _)) => Some(path.clone()),
            Err(_) => None,
        });

        results
    }
}

fn check_size(content: &str) -> Result<(), TuringMachineError> {
    if content.len() > MAX_DEFINITION_SIZE {
        return Err(TuringMachineError::ValidationError(format!(
            "Definition is {} bytes, the limit is {}",
            content.len(),
            MAX_DEFINITION_SIZE
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::TuringMachine;
    use crate::types::{Verdict, DEFAULT_MAX_STEPS};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn machines_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("machines")
    }

    #[test]
    fn test_load_valid_definition() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.tm");

        let content = "name: Test\naccept: stop\nrules:\n  start:\n    a -> b, R, stop\n  stop:";

        let mut file = File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let definition = ProgramLoader::load_definition(&file_path).unwrap();
        assert_eq!(definition.name, "Test");
        assert!(definition.rules.contains_key("start"));
        assert!(definition.rules.contains_key("stop"));
    }

    #[test]
    fn test_load_invalid_definition() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.tm");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"This is not a valid definition").unwrap();

        let result = ProgramLoader::load_definition(&file_path);
        assert!(matches!(result, Err(TuringMachineError::ParseError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ProgramLoader::load_definition(Path::new("/nonexistent/machine.tm"));
        assert!(matches!(result, Err(TuringMachineError::FileError(_))));
    }

    #[test]
    fn test_load_json_definition() {
        let definition =
            ProgramLoader::load_definition(&machines_dir().join("contains-a.json")).unwrap();
        assert_eq!(definition.name, "(a+b)*a(a+b)*");

        let mut machine = TuringMachine::try_new(definition).unwrap();
        machine.load("bba");
        assert_eq!(machine.run(DEFAULT_MAX_STEPS), Verdict::Accepted);
        machine.load("bbb");
        assert_eq!(machine.run(DEFAULT_MAX_STEPS), Verdict::Rejected);
    }

    #[test]
    fn test_load_json_decode_error() {
        let result = ProgramLoader::load_definition_from_json("{ \"name\": 3 }");
        assert!(matches!(result, Err(TuringMachineError::DecodeError(_))));
    }

    #[test]
    fn test_load_json_runs_analyzer() {
        let content = r#"{
            "name": "Bad",
            "states": ["q0"],
            "input_alphabet": ["a"],
            "tape_alphabet": ["a"],
            "rules": {},
            "initial_state": "q0",
            "accepting_states": []
        }"#;

        let error = ProgramLoader::load_definition_from_json(content).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Definition validation error: Blank symbol '_' is not in the tape alphabet"
        );
    }

    #[test]
    fn test_oversized_definition() {
        let content = "#".repeat(MAX_DEFINITION_SIZE + 1);
        let result = ProgramLoader::load_definition_from_string(&content);
        assert!(matches!(result, Err(TuringMachineError::ValidationError(_))));
    }

    #[test]
    fn test_load_definitions_from_directory() {
        let dir = tempdir().unwrap();

        let valid_content = "name: Valid\naccept: stop\nrules:\n  start:\n    a -> b, R, stop";
        File::create(dir.path().join("valid.tm"))
            .unwrap()
            .write_all(valid_content.as_bytes())
            .unwrap();

        File::create(dir.path().join("invalid.json"))
            .unwrap()
            .write_all(b"not json")
            .unwrap();

        File::create(dir.path().join("ignored.txt"))
            .unwrap()
            .write_all(b"This file should be ignored")
            .unwrap();

        let results = ProgramLoader::load_definitions(dir.path());

        // 1 success and 1 error
        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[test]
    fn test_load_missing_directory() {
        let results = ProgramLoader::load_definitions(Path::new("/nonexistent/machines"));
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(TuringMachineError::FileError(_))));
    }

    #[test]
    fn test_bundled_machines_load() {
        let results = ProgramLoader::load_definitions(&machines_dir());

        assert_eq!(results.len(), 4);
        for result in &results {
            assert!(result.is_ok(), "{:?}", result);
        }

        let names: Vec<&str> = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|(_, definition)| definition.name.as_str())
            .collect();
        assert_eq!(names, vec!["(ab)*", "(a+b)*a(a+b)*", "(a|b)*abb", "0*1*"]);
    }
}
