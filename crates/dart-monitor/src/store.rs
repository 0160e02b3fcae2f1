//! 알림 완료 접수번호 저장소.
//!
//! 실행 시작 시 한 번 읽고 종료 시 한 번 씁니다. 파일은 정렬된 접수번호
//! JSON 배열이며, 임시 파일에 쓴 뒤 이름을 바꿔 교체합니다.
//!
//! 동시 실행 보호는 없습니다. 한 번에 하나의 실행만 있어야 합니다.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{MonitorError, Result};

/// 이미 처리한 공시 접수번호 집합.
#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    seen: BTreeSet<String>,
    /// 로드 이후 추가된 건수
    added: usize,
}

impl SeenStore {
    /// 상태 파일을 읽습니다.
    ///
    /// 파일이 없으면 빈 집합, 내용이 손상되었으면 에러를 반환합니다.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let seen = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<BTreeSet<String>>(&content).map_err(|source| {
                MonitorError::CorruptState {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "상태 파일 없음, 빈 집합으로 시작");
                BTreeSet::new()
            }
            Err(e) => return Err(MonitorError::io(&path, e)),
        };

        debug!(path = %path.display(), count = seen.len(), "상태 파일 로드");
        Ok(Self {
            path,
            seen,
            added: 0,
        })
    }

    pub fn contains(&self, receipt_no: &str) -> bool {
        self.seen.contains(receipt_no)
    }

    /// 접수번호를 추가합니다. 새로 추가되었으면 `true`.
    pub fn add(&mut self, receipt_no: impl Into<String>) -> bool {
        let inserted = self.seen.insert(receipt_no.into());
        if inserted {
            self.added += 1;
        }
        inserted
    }

    /// 현재 집합을 상태 파일에 씁니다.
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| MonitorError::io(parent, e))?;
        }

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let json = serde_json::to_string_pretty(&self.seen)?;
        let mut file = File::create(&tmp_path).map_err(|e| MonitorError::io(&tmp_path, e))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| MonitorError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| MonitorError::io(&self.path, e))?;

        info!(
            path = %self.path.display(),
            total = self.seen.len(),
            added = self.added,
            "상태 파일 저장"
        );
        Ok(())
    }

    /// 이번 실행에서 추가된 건수.
    pub fn added(&self) -> usize {
        self.added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeenStore::load(dir.path().join("seen.json")).unwrap();
        assert!(!store.contains("20250718000001"));
        assert_eq!(store.added(), 0);
    }

    #[test]
    fn test_flush_writes_sorted_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("seen.json");

        let mut store = SeenStore::load(&path).unwrap();
        assert!(store.add("20250719000002"));
        assert!(store.add("20250718000001"));
        assert!(!store.add("20250718000001"));
        store.flush().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let ids: Vec<String> = serde_json::from_str(&content).unwrap();
        assert_eq!(ids, vec!["20250718000001", "20250719000002"]);
        assert!(!path.with_extension("json.tmp").exists());

        let reloaded = SeenStore::load(&path).unwrap();
        assert!(reloaded.contains("20250719000002"));
        assert_eq!(reloaded.added(), 0);
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        fs::write(&path, "{not json").unwrap();

        let err = SeenStore::load(&path).unwrap_err();
        assert!(matches!(err, MonitorError::CorruptState { .. }));
    }
}
