// Unit tests for the IPC connection file

use crate::connection_info::{CONNECTION_FILE_NAME, ConnectionInfo};

use tempfile::TempDir;

/// **VALUE**: Verifies clients can read back the port and token the server bound.
///
/// **WHY THIS MATTERS**: The UI shell and transport bridge find the server only through
/// this file.
///
/// **BUG THIS CATCHES**: Would catch a renamed field or a leftover temp file.
#[test]
fn given_connection_info_when_written_then_clients_can_read_it() {
    let temp_dir = TempDir::new().unwrap();
    let info = ConnectionInfo::new(45123, "token-abc".to_string());

    let path = info.write(temp_dir.path()).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["port"], 45123);
    assert_eq!(raw["auth_token"], "token-abc");
    assert_eq!(path, temp_dir.path().join(CONNECTION_FILE_NAME));
    assert!(!temp_dir.path().join("ipc.json.tmp").exists());
}

#[test]
fn given_written_file_when_removed_twice_then_both_succeed() {
    let temp_dir = TempDir::new().unwrap();
    ConnectionInfo::new(1, "t".to_string())
        .write(temp_dir.path())
        .unwrap();

    ConnectionInfo::remove(temp_dir.path()).unwrap();
    ConnectionInfo::remove(temp_dir.path()).unwrap();

    assert!(!ConnectionInfo::path(temp_dir.path()).exists());
}
