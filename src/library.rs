//! A directory of numbered test setups, stored as `test<ID>.xml`.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::{Configuration, LibraryError, Result};

pub const DEFAULT_LIBRARY_ROOT: &str = "test_configs/keysight_scope";

const FILE_PREFIX: &str = "test";
const FILE_SUFFIX: &str = ".xml";

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Numeric IDs first, by value; then everything else, case-insensitively.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a_num), Ok(b_num)) => a_num.cmp(&b_num).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)),
    }
}

/// Extract the test ID from a `test<ID>.xml` file name; case is ignored for prefix and suffix.
pub(crate) fn id_from_file_name(name: &str) -> Option<&str> {
    let prefix = name.get(..FILE_PREFIX.len())?;
    let suffix_at = name.len().checked_sub(FILE_SUFFIX.len())?;
    let suffix = name.get(suffix_at..)?;
    if !prefix.eq_ignore_ascii_case(FILE_PREFIX) || !suffix.eq_ignore_ascii_case(FILE_SUFFIX) {
        return None
    }
    let id = name.get(FILE_PREFIX.len()..suffix_at)?;
    if is_valid_id(id) { Some(id) } else { None }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    root: PathBuf,
}

impl Default for Library {
    fn default() -> Self {
        Library::new(DEFAULT_LIBRARY_ROOT)
    }
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Library {
        Library { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        let id = id.trim();
        if !is_valid_id(id) {
            return Err(LibraryError::InvalidTestId { id: id.to_owned() }.into())
        }
        Ok(self.root.join(format!("{}{}{}", FILE_PREFIX, id, FILE_SUFFIX)))
    }

    /// Recover the test ID of a library file.
    pub fn id_from_path(path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        id_from_file_name(name).map(str::to_owned)
    }

    /// IDs of all tests in the library. A library directory that does not exist yet is empty.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() { continue }
            if let Some(id) = Library::id_from_path(&entry.path()) {
                ids.push(id);
            }
        }
        ids.sort_by(|a, b| compare_ids(a, b));
        log::debug!("found {} test(s) in {}", ids.len(), self.root.display());
        Ok(ids)
    }

    fn existing_path_for(&self, id: &str) -> Result<PathBuf> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(LibraryError::NotFound { path }.into())
        }
        Ok(path)
    }

    pub fn load(&self, id: &str) -> Result<Configuration> {
        let path = self.existing_path_for(id)?;
        load_file(&path)
    }

    pub fn save(&self, id: &str, config: &Configuration) -> Result<PathBuf> {
        let path = self.path_for(id)?;
        self.ensure()?;
        save_file(&path, config)?;
        Ok(path)
    }

    /// Copy test `source` to the new test `target`, which must not exist yet.
    pub fn clone_test(&self, source: &str, target: &str) -> Result<PathBuf> {
        let source_path = self.existing_path_for(source)?;
        let target_path = self.path_for(target)?;
        if target_path.exists() {
            return Err(LibraryError::AlreadyExists { path: target_path }.into())
        }
        fs::copy(&source_path, &target_path)?;
        log::debug!("cloned {} to {}", source_path.display(), target_path.display());
        Ok(target_path)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.existing_path_for(id)?;
        fs::remove_file(&path)?;
        log::debug!("deleted {}", path.display());
        Ok(())
    }
}

pub fn load_file(path: &Path) -> Result<Configuration> {
    let document = match fs::read_to_string(path) {
        Ok(document) => document,
        Err(error) if error.kind() == io::ErrorKind::NotFound =>
            return Err(LibraryError::NotFound { path: path.to_owned() }.into()),
        Err(error) => return Err(error.into()),
    };
    log::debug!("loading {}", path.display());
    crate::parse(&document)
}

pub fn save_file(path: &Path, config: &Configuration) -> Result<()> {
    let document = crate::serialize(config)?;
    fs::write(path, document)?;
    log::debug!("saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;

    struct TempLibrary(Library);

    impl TempLibrary {
        fn new(name: &str) -> TempLibrary {
            let root = std::env::temp_dir()
                .join(format!("scopeconf-{}-{}", name, std::process::id()));
            let _ = fs::remove_dir_all(&root);
            TempLibrary(Library::new(root))
        }
    }

    impl Drop for TempLibrary {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(self.0.root());
        }
    }

    #[test]
    fn test_id_from_file_name() {
        assert_eq!(id_from_file_name("test001.xml"), Some("001"));
        assert_eq!(id_from_file_name("TEST12.XML"), Some("12"));
        assert_eq!(id_from_file_name("test_a.xml"), Some("_a"));
        assert_eq!(id_from_file_name("test.xml"), None);
        assert_eq!(id_from_file_name("test1.2.xml"), None);
        assert_eq!(id_from_file_name("best1.xml"), None);
        assert_eq!(id_from_file_name("test1.txt"), None);
        assert_eq!(id_from_file_name("x"), None);
    }

    #[test]
    fn test_path_for() {
        let library = Library::new("/tmp/lib");
        assert_eq!(library.path_for("7").unwrap(), PathBuf::from("/tmp/lib/test7.xml"));
        assert!(matches!(library.path_for(""),
            Err(Error::Library(LibraryError::InvalidTestId { .. }))));
        assert!(matches!(library.path_for("../x"),
            Err(Error::Library(LibraryError::InvalidTestId { .. }))));
    }

    #[test]
    fn test_sort_order() {
        let mut ids = vec!["b", "10", "A", "2", "c", "002"];
        ids.sort_by(|a, b| compare_ids(a, b));
        assert_eq!(ids, ["002", "2", "10", "A", "b", "c"]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let library = TempLibrary::new("missing");
        assert_eq!(library.0.list().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_save_load_list() {
        let library = TempLibrary::new("save");
        let mut config = Configuration::default();
        config.display_label = true;
        config.time_scale = "0.001".to_owned();
        let path = library.0.save("10", &config).unwrap();
        assert!(path.ends_with("test10.xml"));
        library.0.save("9", &Configuration::default()).unwrap();
        fs::write(library.0.root().join("notes.txt"), "unrelated").unwrap();
        assert_eq!(library.0.list().unwrap(), ["9", "10"]);
        assert_eq!(library.0.load("10").unwrap(), config);
        assert_eq!(Library::id_from_path(&path).as_deref(), Some("10"));
    }

    #[test]
    fn test_clone_and_delete() {
        let library = TempLibrary::new("clone");
        library.0.save("1", &Configuration::default()).unwrap();
        library.0.clone_test("1", "2").unwrap();
        assert_eq!(library.0.list().unwrap(), ["1", "2"]);
        assert!(matches!(library.0.clone_test("1", "2"),
            Err(Error::Library(LibraryError::AlreadyExists { .. }))));
        assert!(matches!(library.0.clone_test("3", "4"),
            Err(Error::Library(LibraryError::NotFound { .. }))));
        library.0.delete("1").unwrap();
        assert_eq!(library.0.list().unwrap(), ["2"]);
        assert!(matches!(library.0.delete("1"),
            Err(Error::Library(LibraryError::NotFound { .. }))));
    }

    #[test]
    fn test_load_foreign_document() {
        let library = TempLibrary::new("foreign");
        library.0.ensure().unwrap();
        fs::write(library.0.path_for("5").unwrap(), "<settings/>").unwrap();
        assert!(matches!(library.0.load("5"), Err(Error::Schema(_))));
    }
}
