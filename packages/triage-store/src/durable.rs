use std::{
	ffi::OsString,
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};

use crate::{Error, Result};

/// Replaces the contents of `path` so readers see either the old value or the new one.
///
/// The value is written and synced to `<path>.tmp`, then renamed over `path`.
pub fn write_replace(path: &Path, contents: &[u8]) -> Result<()> {
	let tmp = temp_path(path);
	let persist = |source| Error::Persist { path: path.to_path_buf(), source };

	if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(persist)?;
	}

	let mut file = File::create(&tmp).map_err(persist)?;

	file.write_all(contents).map_err(persist)?;
	file.sync_all().map_err(persist)?;

	drop(file);

	fs::rename(&tmp, path).map_err(persist)
}

pub fn temp_path(path: &Path) -> PathBuf {
	let mut raw = OsString::from(path.as_os_str());

	raw.push(".tmp");

	PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn replaces_existing_value_and_removes_temp_file() {
		let dir = tempfile::tempdir().expect("tempdir");
		let path = dir.path().join("value");

		write_replace(&path, b"first").expect("first write");
		write_replace(&path, b"second").expect("second write");

		assert_eq!(fs::read_to_string(&path).expect("read"), "second");
		assert!(!temp_path(&path).exists());
	}

	#[test]
	fn creates_missing_parent_directories() {
		let dir = tempfile::tempdir().expect("tempdir");
		let path = dir.path().join("state").join("nested").join("value");

		write_replace(&path, b"x").expect("write");

		assert_eq!(fs::read_to_string(&path).expect("read"), "x");
	}
}
