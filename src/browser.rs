use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "ico",
];

const FORBIDDEN_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

// ---------------------------------------------------------------------------
// Format allow-list
// ---------------------------------------------------------------------------

/// Immutable set of recognized image extensions, injected at construction so
/// tests can substitute their own.
#[derive(Debug, Clone)]
pub struct FormatSet {
    extensions: Vec<String>,
}

impl FormatSet {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

impl Default for FormatSet {
    fn default() -> Self {
        Self::new(IMAGE_EXTENSIONS.iter().copied())
    }
}

// ---------------------------------------------------------------------------
// Directory browser
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LoadResult {
    pub path: PathBuf,
    pub index: usize,
    pub count: usize,
}

pub struct DeleteResult {
    pub deleted: PathBuf,
    pub companions: Vec<PathBuf>,
    pub remaining: usize,
}

/// Ordered list of image files in one directory, plus the current selection.
///
/// The list is rebuilt wholesale by `load` and only ever mutated in place by
/// `delete_current` (one removal) and `rename_current` (one path update).
/// Navigation never touches the list.
pub struct DirectoryBrowser {
    formats: FormatSet,
    files: Vec<PathBuf>,
    current: Option<usize>,
}

impl DirectoryBrowser {
    pub fn new(formats: FormatSet) -> Self {
        Self {
            formats,
            files: Vec::new(),
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.map(|i| self.files[i].as_path())
    }

    /// Rebuild the file list from `path`'s directory and select `path`.
    ///
    /// Siblings are filtered through the format set and sorted by full path,
    /// case-insensitively. If `path` itself does not make it into the list
    /// (unsupported extension), the browser resets to empty.
    pub fn load(&mut self, path: &Path) -> Result<LoadResult> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let dir = parent_dir(path);
        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && self.formats.matches(p))
            .collect();
        files.sort_by_cached_key(|p| p.to_string_lossy().to_lowercase());
        files.dedup();

        match files
            .iter()
            .position(|p| p.file_name() == path.file_name())
        {
            Some(index) => {
                self.files = files;
                self.current = Some(index);
                Ok(LoadResult {
                    path: self.files[index].clone(),
                    index,
                    count: self.files.len(),
                })
            }
            None => {
                self.files.clear();
                self.current = None;
                Err(Error::UnsupportedFormat(path.to_path_buf()))
            }
        }
    }

    /// Advance with wraparound. Returns the new current path, or `None` on an
    /// empty list.
    pub fn next(&mut self) -> Option<&Path> {
        let len = self.files.len();
        if len == 0 {
            return None;
        }
        let index = self.current.map_or(0, |i| (i + 1) % len);
        self.current = Some(index);
        Some(&self.files[index])
    }

    /// Retreat with wraparound. Returns the new current path, or `None` on an
    /// empty list.
    pub fn previous(&mut self) -> Option<&Path> {
        let len = self.files.len();
        if len == 0 {
            return None;
        }
        let index = self.current.map_or(0, |i| (i + len - 1) % len);
        self.current = Some(index);
        Some(&self.files[index])
    }

    pub fn first(&mut self) -> Option<&Path> {
        if self.files.is_empty() {
            return None;
        }
        self.current = Some(0);
        Some(&self.files[0])
    }

    pub fn last(&mut self) -> Option<&Path> {
        if self.files.is_empty() {
            return None;
        }
        let index = self.files.len() - 1;
        self.current = Some(index);
        Some(&self.files[index])
    }

    /// Files sharing the current image's base name with a different,
    /// non-image extension (e.g. a paired video clip). They are carried along
    /// by delete and rename.
    pub fn companion_files(&self, path: &Path) -> Vec<PathBuf> {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return Vec::new();
        };
        let Ok(entries) = fs::read_dir(parent_dir(path)) else {
            return Vec::new();
        };
        let mut companions: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p != path && !self.formats.matches(p))
            .filter(|p| p.extension().is_some())
            .filter(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| s.eq_ignore_ascii_case(stem))
            })
            .collect();
        companions.sort();
        companions
    }

    /// Move the current image and its companions to the trash, companions
    /// first, then drop the entry from the list.
    ///
    /// A trash failure leaves `files` and the selection unmodified; companions
    /// trashed before the failure stay trashed (reported, not rolled back).
    pub fn delete_current(&mut self) -> Result<Option<DeleteResult>> {
        let Some(index) = self.current else {
            return Ok(None);
        };
        let path = self.files[index].clone();
        let companions = self.companion_files(&path);

        for companion in &companions {
            trash::delete(companion)?;
        }
        trash::delete(&path)?;

        self.remove_current();
        Ok(Some(DeleteResult {
            deleted: path,
            companions,
            remaining: self.files.len(),
        }))
    }

    fn remove_current(&mut self) {
        let Some(index) = self.current else { return };
        self.files.remove(index);
        self.current = if self.files.is_empty() {
            None
        } else {
            Some(index.min(self.files.len() - 1))
        };
    }

    /// Rename the current image (and its companions) to `new_base`, keeping
    /// each extension. Returns the new image path, or `None` when nothing is
    /// selected or the name is unchanged.
    ///
    /// The list entry is updated in place WITHOUT re-sorting: re-sorting
    /// would teleport the user's navigation position. The list may drift out
    /// of lexicographic order until the next load.
    pub fn rename_current(&mut self, new_base: &str) -> Result<Option<PathBuf>> {
        let Some(index) = self.current else {
            return Ok(None);
        };
        let new_base = new_base.trim();
        validate_base_name(new_base)?;

        let path = self.files[index].clone();
        if path.file_stem().and_then(|s| s.to_str()) == Some(new_base) {
            return Ok(None);
        }
        let dir = parent_dir(&path);

        // Companions move first; the image move is last so that a failure
        // before it leaves the image (and the list) untouched.
        let mut moves: Vec<(PathBuf, PathBuf)> = Vec::new();
        for companion in self.companion_files(&path) {
            let target = retarget(&dir, new_base, &companion);
            moves.push((companion, target));
        }
        let new_path = retarget(&dir, new_base, &path);
        moves.push((path, new_path.clone()));

        for (_, target) in &moves {
            if target.exists() {
                let name = target
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                return Err(Error::NameConflict(name));
            }
        }

        for (source, target) in &moves {
            fs::rename(source, target).map_err(Error::RenameFailed)?;
        }

        self.files[index] = new_path.clone();
        Ok(Some(new_path))
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn retarget(dir: &Path, new_base: &str, source: &Path) -> PathBuf {
    match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => dir.join(format!("{new_base}.{ext}")),
        None => dir.join(new_base),
    }
}

fn validate_base_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::InvalidName(name.to_string()));
    }
    if name
        .chars()
        .any(|c| c.is_control() || FORBIDDEN_NAME_CHARS.contains(&c))
    {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).expect("failed to create test file");
        file.write_all(b"fake image data")
            .expect("failed to write test file");
        path
    }

    fn browser() -> DirectoryBrowser {
        DirectoryBrowser::new(FormatSet::default())
    }

    #[test]
    fn load_sorts_siblings_and_selects_the_loaded_path() {
        let dir = tempdir().expect("failed to create temp dir");
        touch(dir.path(), "c.jpg");
        let b = touch(dir.path(), "b.png");
        touch(dir.path(), "a.png");

        let mut browser = browser();
        let result = browser.load(&b).expect("load failed");

        assert_eq!(result.index, 1);
        assert_eq!(result.count, 3);
        assert_eq!(browser.current_path(), Some(b.as_path()));
    }

    #[test]
    fn load_sort_is_case_insensitive() {
        let dir = tempdir().expect("failed to create temp dir");
        touch(dir.path(), "B.png");
        let a = touch(dir.path(), "a.png");

        let mut browser = browser();
        let result = browser.load(&a).expect("load failed");

        assert_eq!(result.index, 0);
        assert_eq!(result.count, 2);
    }

    #[test]
    fn load_ignores_unsupported_siblings() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "clip.mp4");

        let mut browser = browser();
        let result = browser.load(&a).expect("load failed");
        assert_eq!(result.count, 1);
    }

    #[test]
    fn load_missing_path_is_not_found() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut browser = browser();
        let err = browser.load(&dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn load_unsupported_extension_resets_to_empty() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");
        let text = touch(dir.path(), "notes.txt");

        let mut browser = browser();
        browser.load(&a).expect("load failed");
        assert_eq!(browser.len(), 1);

        let err = browser.load(&text).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert!(browser.is_empty());
        assert_eq!(browser.current_index(), None);
    }

    #[test]
    fn format_set_is_injectable() {
        let dir = tempdir().expect("failed to create temp dir");
        let raw = touch(dir.path(), "shot.raw");

        let mut browser = DirectoryBrowser::new(FormatSet::new(["raw"]));
        let result = browser.load(&raw).expect("load failed");
        assert_eq!(result.count, 1);
    }

    #[test]
    fn next_and_previous_wrap_around() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");
        touch(dir.path(), "b.png");
        let c = touch(dir.path(), "c.jpg");

        let mut browser = browser();
        browser.load(&c).expect("load failed");
        assert_eq!(browser.current_index(), Some(2));

        assert_eq!(browser.next(), Some(a.as_path()));
        assert_eq!(browser.current_index(), Some(0));

        assert_eq!(browser.previous(), Some(c.as_path()));
        assert_eq!(browser.current_index(), Some(2));
    }

    #[test]
    fn next_then_previous_round_trips() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");
        touch(dir.path(), "b.png");

        let mut browser = browser();
        browser.load(&a).expect("load failed");
        browser.next();
        browser.previous();
        assert_eq!(browser.current_path(), Some(a.as_path()));
    }

    #[test]
    fn navigation_on_single_entry_keeps_the_index() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");

        let mut browser = browser();
        browser.load(&a).expect("load failed");
        browser.next();
        assert_eq!(browser.current_index(), Some(0));
        browser.previous();
        assert_eq!(browser.current_index(), Some(0));
    }

    #[test]
    fn navigation_on_empty_list_is_a_no_op() {
        let mut browser = browser();
        assert_eq!(browser.next(), None);
        assert_eq!(browser.previous(), None);
        assert_eq!(browser.first(), None);
        assert_eq!(browser.last(), None);
        assert_eq!(browser.current_index(), None);
    }

    #[test]
    fn first_and_last_jump_to_the_ends() {
        let dir = tempdir().expect("failed to create temp dir");
        touch(dir.path(), "a.png");
        let b = touch(dir.path(), "b.png");
        touch(dir.path(), "c.jpg");

        let mut browser = browser();
        browser.load(&b).expect("load failed");
        browser.first();
        assert_eq!(browser.current_index(), Some(0));
        browser.last();
        assert_eq!(browser.current_index(), Some(2));
    }

    #[test]
    fn companion_files_share_the_stem_but_not_the_format() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");
        let clip = touch(dir.path(), "a.mp4");
        touch(dir.path(), "a.jpg"); // image sibling, not a companion
        touch(dir.path(), "b.mp4"); // different stem

        let browser = browser();
        assert_eq!(browser.companion_files(&a), vec![clip]);
    }

    #[test]
    fn remove_current_on_single_entry_empties_the_list() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");

        let mut browser = browser();
        browser.load(&a).expect("load failed");
        browser.remove_current();

        assert!(browser.is_empty());
        assert_eq!(browser.current_index(), None);
    }

    #[test]
    fn remove_current_at_the_tail_clamps_the_index() {
        let dir = tempdir().expect("failed to create temp dir");
        touch(dir.path(), "a.png");
        let b = touch(dir.path(), "b.png");

        let mut browser = browser();
        browser.load(&b).expect("load failed");
        browser.remove_current();

        assert_eq!(browser.len(), 1);
        assert_eq!(browser.current_index(), Some(0));
    }

    #[test]
    fn remove_current_in_the_middle_keeps_the_index() {
        let dir = tempdir().expect("failed to create temp dir");
        touch(dir.path(), "a.png");
        let b = touch(dir.path(), "b.png");
        let c = touch(dir.path(), "c.jpg");

        let mut browser = browser();
        browser.load(&b).expect("load failed");
        browser.remove_current();

        assert_eq!(browser.current_index(), Some(1));
        assert_eq!(browser.current_path(), Some(c.as_path()));
    }

    #[test]
    fn rename_moves_the_file_and_its_companion() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");
        touch(dir.path(), "a.mp4");

        let mut browser = browser();
        browser.load(&a).expect("load failed");
        let new_path = browser
            .rename_current("z")
            .expect("rename failed")
            .expect("nothing renamed");

        assert_eq!(new_path, dir.path().join("z.png"));
        assert!(dir.path().join("z.png").exists());
        assert!(dir.path().join("z.mp4").exists());
        assert!(!a.exists());
        assert_eq!(browser.current_path(), Some(new_path.as_path()));
    }

    #[test]
    fn rename_does_not_resort_the_list() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");
        touch(dir.path(), "b.png");

        let mut browser = browser();
        browser.load(&a).expect("load failed");
        browser.rename_current("zzz").expect("rename failed");

        // "zzz.png" sorts after "b.png" but stays at index 0.
        assert_eq!(browser.current_index(), Some(0));
        assert_eq!(
            browser.current_path(),
            Some(dir.path().join("zzz.png").as_path())
        );
    }

    #[test]
    fn rename_onto_an_existing_file_is_a_conflict() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");
        touch(dir.path(), "b.png");

        let mut browser = browser();
        browser.load(&a).expect("load failed");
        let err = browser.rename_current("b").unwrap_err();

        assert!(matches!(err, Error::NameConflict(_)));
        assert!(a.exists());
        assert_eq!(browser.current_path(), Some(a.as_path()));
    }

    #[test]
    fn rename_conflict_checks_companion_targets_too() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "z.mp4");

        let mut browser = browser();
        browser.load(&a).expect("load failed");
        let err = browser.rename_current("z").unwrap_err();

        assert!(matches!(err, Error::NameConflict(_)));
        assert!(a.exists());
        assert!(dir.path().join("a.mp4").exists());
    }

    #[test]
    fn rename_rejects_invalid_names() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");

        let mut browser = browser();
        browser.load(&a).expect("load failed");

        for bad in ["", "   ", "a/b", "a\\b", "a:b", "a?b", ".."] {
            let err = browser.rename_current(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidName(_)), "accepted {bad:?}");
        }
        assert!(a.exists());
    }

    #[test]
    fn rename_to_the_same_name_is_a_no_op() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = touch(dir.path(), "a.png");

        let mut browser = browser();
        browser.load(&a).expect("load failed");
        assert!(browser.rename_current("a").expect("rename failed").is_none());
        assert!(a.exists());
    }
}
