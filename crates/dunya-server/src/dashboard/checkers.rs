//! Completeness checkers
//!
//! A checker inspects a scanned file or a whole release and returns a
//! good/bad verdict with optional JSON details. Checkers are stored in the
//! database by module name and looked up in a [`CheckerRegistry`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Whether a checker looks at single files or whole releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckerType {
    Release,
    File,
}

impl CheckerType {
    pub fn code(self) -> &'static str {
        match self {
            CheckerType::Release => "r",
            CheckerType::File => "f",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "r" => Some(CheckerType::Release),
            "f" => Some(CheckerType::File),
            _ => None,
        }
    }
}

/// A scanned audio file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct FileTarget {
    pub id: Uuid,
    pub name: String,
    pub directory_id: Uuid,
    pub recording_id: Option<Uuid>,
    pub filesize: Option<i64>,
}

/// A release with every file of its matched directories
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseTarget {
    pub id: Uuid,
    pub mbid: Uuid,
    pub title: String,
    pub files: Vec<FileTarget>,
}

#[derive(Debug, Clone, Copy)]
pub enum CheckTarget<'a> {
    File(&'a FileTarget),
    Release(&'a ReleaseTarget),
}

/// Verdict of one checker on one target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub good: bool,
    pub data: Value,
}

impl CheckResult {
    pub fn good(data: Value) -> Self {
        Self { good: true, data }
    }

    pub fn bad(data: Value) -> Self {
        Self { good: false, data }
    }

    /// Single letter code stored with the result
    pub fn code(&self) -> &'static str {
        if self.good {
            "g"
        } else {
            "b"
        }
    }
}

pub trait CompletenessChecker: Send + Sync {
    /// Name under which the checker is stored in `completeness_checkers.module`
    fn module(&self) -> &'static str;

    fn checker_type(&self) -> CheckerType;

    fn check(&self, target: CheckTarget<'_>) -> CheckResult;
}

fn wrong_target(module: &str) -> CheckResult {
    CheckResult::bad(json!({ "error": format!("{} cannot check this target", module) }))
}

/// A file must carry the MusicBrainz recording id it was tagged with
pub struct HasRecordingId;

impl CompletenessChecker for HasRecordingId {
    fn module(&self) -> &'static str {
        "file.has_recording_id"
    }

    fn checker_type(&self) -> CheckerType {
        CheckerType::File
    }

    fn check(&self, target: CheckTarget<'_>) -> CheckResult {
        match target {
            CheckTarget::File(file) => match file.recording_id {
                Some(id) => CheckResult::good(json!({ "recordingid": id })),
                None => CheckResult::bad(json!({ "error": "No recording id in file tags" })),
            },
            CheckTarget::Release(_) => wrong_target(self.module()),
        }
    }
}

/// A file must not be empty
pub struct NonEmptyFile;

impl CompletenessChecker for NonEmptyFile {
    fn module(&self) -> &'static str {
        "file.nonempty"
    }

    fn checker_type(&self) -> CheckerType {
        CheckerType::File
    }

    fn check(&self, target: CheckTarget<'_>) -> CheckResult {
        match target {
            CheckTarget::File(file) => {
                let size = file.filesize.unwrap_or(0);
                let data = json!({ "filesize": size });
                if size > 0 {
                    CheckResult::good(data)
                } else {
                    CheckResult::bad(data)
                }
            },
            CheckTarget::Release(_) => wrong_target(self.module()),
        }
    }
}

/// Every file of a release has been matched to a recording
pub struct AllFilesMatched;

impl CompletenessChecker for AllFilesMatched {
    fn module(&self) -> &'static str {
        "release.all_files_matched"
    }

    fn checker_type(&self) -> CheckerType {
        CheckerType::Release
    }

    fn check(&self, target: CheckTarget<'_>) -> CheckResult {
        match target {
            CheckTarget::Release(release) => {
                let unmatched: Vec<&str> = release
                    .files
                    .iter()
                    .filter(|f| f.recording_id.is_none())
                    .map(|f| f.name.as_str())
                    .collect();
                let data = json!({
                    "numfiles": release.files.len(),
                    "unmatched": unmatched,
                });
                if !release.files.is_empty() && unmatched.is_empty() {
                    CheckResult::good(data)
                } else {
                    CheckResult::bad(data)
                }
            },
            CheckTarget::File(_) => wrong_target(self.module()),
        }
    }
}

/// Checkers available to the dashboard, keyed by module name
#[derive(Clone)]
pub struct CheckerRegistry {
    checkers: HashMap<&'static str, Arc<dyn CompletenessChecker>>,
}

impl CheckerRegistry {
    pub fn empty() -> Self {
        Self {
            checkers: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(HasRecordingId));
        registry.register(Arc::new(NonEmptyFile));
        registry.register(Arc::new(AllFilesMatched));
        registry
    }

    pub fn register(&mut self, checker: Arc<dyn CompletenessChecker>) {
        self.checkers.insert(checker.module(), checker);
    }

    pub fn get(&self, module: &str) -> Option<Arc<dyn CompletenessChecker>> {
        self.checkers.get(module).cloned()
    }
}

impl Default for CheckerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A stored checker result joined with its checker
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ResultRow {
    pub id: i64,
    pub checker_id: Uuid,
    pub checker_name: String,
    pub result: String,
    pub data: Option<Value>,
    pub datetime: DateTime<Utc>,
}

impl ResultRow {
    pub fn is_good(&self) -> bool {
        self.result == "g"
    }
}

fn newest_first(rows: &mut [ResultRow]) {
    rows.sort_by(|a, b| b.datetime.cmp(&a.datetime).then(b.id.cmp(&a.id)));
}

/// The newest result of each checker, in the order the checkers are given.
/// Checkers that never ran on the target are skipped.
pub fn latest_results(mut rows: Vec<ResultRow>, checker_order: &[Uuid]) -> Vec<ResultRow> {
    newest_first(&mut rows);
    checker_order
        .iter()
        .filter_map(|checker| rows.iter().find(|r| &r.checker_id == checker).cloned())
        .collect()
}

/// Every result of one checker except the newest, newest first
pub fn previous_results(mut rows: Vec<ResultRow>, checker_id: Uuid) -> Vec<ResultRow> {
    rows.retain(|r| r.checker_id == checker_id);
    newest_first(&mut rows);
    rows.into_iter().skip(1).collect()
}

/// Number of checkers whose newest verdict is bad
pub fn error_count(rows: Vec<ResultRow>, checker_order: &[Uuid]) -> usize {
    latest_results(rows, checker_order)
        .iter()
        .filter(|r| !r.is_good())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(recording: Option<Uuid>, size: i64) -> FileTarget {
        FileTarget {
            id: Uuid::new_v4(),
            name: "01 Track.mp3".to_string(),
            directory_id: Uuid::new_v4(),
            recording_id: recording,
            filesize: Some(size),
        }
    }

    fn result(id: i64, checker: Uuid, good: bool, minute: u32) -> ResultRow {
        ResultRow {
            id,
            checker_id: checker,
            checker_name: "checker".to_string(),
            result: if good { "g" } else { "b" }.to_string(),
            data: None,
            datetime: Utc.with_ymd_and_hms(2014, 6, 1, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_has_recording_id() {
        let checker = HasRecordingId;
        assert!(checker.check(CheckTarget::File(&file(Some(Uuid::new_v4()), 10))).good);
        let bad = checker.check(CheckTarget::File(&file(None, 10)));
        assert!(!bad.good);
        assert_eq!(bad.code(), "b");
    }

    #[test]
    fn test_nonempty_file() {
        assert!(NonEmptyFile.check(CheckTarget::File(&file(None, 1))).good);
        assert!(!NonEmptyFile.check(CheckTarget::File(&file(None, 0))).good);
    }

    #[test]
    fn test_all_files_matched() {
        let mut release = ReleaseTarget {
            id: Uuid::new_v4(),
            mbid: Uuid::new_v4(),
            title: "Live".to_string(),
            files: vec![],
        };
        assert!(!AllFilesMatched.check(CheckTarget::Release(&release)).good);

        release.files = vec![file(Some(Uuid::new_v4()), 5), file(None, 5)];
        let verdict = AllFilesMatched.check(CheckTarget::Release(&release));
        assert!(!verdict.good);
        assert_eq!(verdict.data["unmatched"][0], "01 Track.mp3");

        release.files.pop();
        assert!(AllFilesMatched.check(CheckTarget::Release(&release)).good);
    }

    #[test]
    fn test_checker_rejects_wrong_target() {
        let release = ReleaseTarget {
            id: Uuid::new_v4(),
            mbid: Uuid::new_v4(),
            title: "x".to_string(),
            files: vec![],
        };
        assert!(!HasRecordingId.check(CheckTarget::Release(&release)).good);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = CheckerRegistry::builtin();
        let checker = registry.get("release.all_files_matched").unwrap();
        assert_eq!(checker.checker_type(), CheckerType::Release);
        assert!(registry.get("missing.checker").is_none());
        assert_eq!(CheckerType::from_code("f"), Some(CheckerType::File));
    }

    #[test]
    fn test_latest_results_one_per_checker() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let rows = vec![
            result(1, a, false, 0),
            result(2, b, true, 1),
            result(3, a, true, 2),
        ];

        let latest = latest_results(rows.clone(), &[b, a, c]);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].id, 2);
        assert_eq!(latest[1].id, 3);
        assert_eq!(error_count(rows.clone(), &[a, b]), 0);

        let rest = previous_results(rows, a);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, 1);
    }

    #[test]
    fn test_error_count_uses_latest_verdict() {
        let a = Uuid::new_v4();
        let rows = vec![result(1, a, true, 0), result(2, a, false, 5)];
        assert_eq!(error_count(rows, &[a]), 1);
    }
}
