use std::path::PathBuf;

pub const APP_NAME: &str = "taskmaster";

const DATA_DIR_ENV: &str = "TASKMASTER_DATA_DIR";

/// Directory holding local storage, the session file and logs.
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return PathBuf::from(dir);
    }

    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn local_storage_path() -> PathBuf {
    get_data_dir().join("local_storage.json")
}

pub fn session_path() -> PathBuf {
    get_data_dir().join("session.json")
}

pub fn log_dir() -> PathBuf {
    get_data_dir().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_under_data_dir() {
        let data_dir = get_data_dir();
        assert!(local_storage_path().starts_with(&data_dir));
        assert!(session_path().starts_with(&data_dir));
        assert!(log_dir().ends_with("logs"));
    }
}
