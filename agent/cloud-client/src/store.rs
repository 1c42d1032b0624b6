/*!

The `store` module persists the instance records of one profile as `<profile-id>.json` in the
factory's state directory, so that a restarted server re-adopts the VMs it launched. The profile id
is escaped for the file system.

!*/

use cloud_model::{Configuration, InstanceRecord};
use log::{trace, warn};
use serde_json::Value;
use snafu::{ResultExt, Snafu};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    #[snafu(display("Unable to read '{}': {}", path.display(), source))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to parse '{}': {}", path.display(), source))]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("Unable to serialize instance record: {}", source))]
    Record { source: cloud_model::Error },

    #[snafu(display("Unable to serialize instance records: {}", source))]
    Serialize { source: serde_json::Error },

    #[snafu(display("Unable to write '{}': {}", path.display(), source))]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to replace '{}': {}", path.display(), source))]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

#[derive(Clone, Debug)]
pub struct InstanceStore {
    path: PathBuf,
}

impl InstanceStore {
    pub fn new(state_directory: &Path, profile_id: &str) -> Self {
        Self {
            path: state_directory.join(format!("{}.json", file_stem(profile_id))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved records. A missing file means nothing was saved yet. Records that cannot be
    /// read are skipped with a warning; the rest are returned.
    pub fn load(&self) -> StoreResult<Vec<InstanceRecord>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context(ReadSnafu { path: &self.path }),
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        let values: Vec<Value> =
            serde_json::from_str(&data).context(ParseSnafu { path: &self.path })?;
        Ok(values
            .into_iter()
            .filter_map(|value| match InstanceRecord::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping record in '{}': {}", self.path.display(), e);
                    None
                }
            })
            .collect())
    }

    /// Replace the saved records. The new content is written to a temporary file in the same
    /// directory and renamed over the old file, so readers see either the old or the new list.
    pub fn save(&self, records: &[InstanceRecord]) -> StoreResult<()> {
        let values = records
            .iter()
            .cloned()
            .map(InstanceRecord::into_value)
            .collect::<Result<Vec<_>, _>>()
            .context(RecordSnafu)?;
        let data = serde_json::to_vec_pretty(&values).context(SerializeSnafu)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut file = tempfile::NamedTempFile::new_in(dir).context(WriteSnafu { path: dir })?;
        file.write_all(&data)
            .and_then(|_| file.as_file().sync_all())
            .context(WriteSnafu { path: file.path() })?;
        file.persist(&self.path)
            .context(PersistSnafu { path: &self.path })?;
        trace!(
            "Saved {} instance record(s) to '{}'",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Profile ids are chosen by the fleet manager. Every byte outside `[A-Za-z0-9-]` is written as
/// `_` followed by two hex digits, so distinct ids never share a file.
fn file_stem(profile_id: &str) -> String {
    if profile_id.is_empty() {
        return "_".to_string();
    }
    profile_id
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b == b'-' {
                char::from(b).to_string()
            } else {
                format!("_{:02x}", b)
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use cloud_model::InstanceStatus;

    #[test]
    fn file_names() {
        assert_eq!(file_stem("arm-1"), "arm-1");
        assert_eq!(file_stem("../etc/passwd"), "_2e_2e_2fetc_2fpasswd");
        assert_eq!(file_stem(""), "_");
        assert_eq!(file_stem("team.a"), "team_2ea");
        assert_eq!(file_stem("team_a"), "team_5fa");
        assert_eq!(file_stem("é"), "_c3_a9");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = InstanceStore::new(dir.path(), "arm-1");
        assert!(store.load().unwrap().is_empty());

        let records = vec![InstanceRecord {
            name: "webA-0a1b2c3d".into(),
            source_name: "webA".into(),
            status: InstanceStatus::Running,
            started_at: None,
            confirmed: true,
        }];
        store.save(&records).unwrap();
        assert_eq!(store.path(), dir.path().join("arm-1.json"));
        assert_eq!(store.load().unwrap(), records);

        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn bad_records_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = InstanceStore::new(dir.path(), "arm-1");
        std::fs::write(
            store.path(),
            r#"[{"name":"web-1","sourceName":"webA","status":"running"},{"name":7}]"#,
        )
        .unwrap();
        let records = store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, InstanceStatus::Running);
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = InstanceStore::new(dir.path(), "arm-1");
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load().unwrap_err(), StoreError::Parse { .. }));
    }
}
