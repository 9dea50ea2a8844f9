use dupsweep_core::{
    ContentHash, FileCatalog, FileIdentity, FileRecord, ScanConfig, ScanError, ScanWarning,
    TypeRegistry, WarningKind,
};
use std::path::{Path, PathBuf};

#[test]
fn test_content_hash_creation_and_hex() {
    let bytes = [0xab; 32];
    let hash = ContentHash::new(bytes);

    let hex = hash.to_hex();
    assert_eq!(hex.len(), 64);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(hex.starts_with("ab"));

    assert_eq!(hash, ContentHash::new(bytes));
    assert_ne!(hash, ContentHash::new([0xcd; 32]));
}

#[test]
fn test_content_hash_of_bytes_matches_blake3() {
    let hash = ContentHash::of_bytes(b"hi");
    assert_eq!(hash.0, *blake3::hash(b"hi").as_bytes());
    assert_ne!(hash, ContentHash::of_bytes(b"ho"));
}

#[test]
fn test_file_identity() {
    let a = FileIdentity::new(1, 42);
    assert_eq!(a.device, 1);
    assert_eq!(a.inode, 42);
    assert_eq!(a, FileIdentity::new(1, 42));
    assert_ne!(a, FileIdentity::new(2, 42));
}

#[test]
fn test_record_extensions() {
    let cases = [
        ("/r/a.txt", "txt"),
        ("/r/archive.tar.gz", "gz"),
        ("/r/Makefile", ""),
        ("/r/.bashrc", ""),
        ("/r/.config.toml", "toml"),
        ("/r/trailing.", ""),
        ("/r/UPPER.TXT", "TXT"),
    ];
    for (path, ext) in cases {
        assert_eq!(FileRecord::new(path, 0, None).extension, ext, "{path}");
    }
}

#[test]
fn test_registry_merge_order_does_not_matter() {
    let mut left = TypeRegistry::new();
    left.increment("txt", Path::new("/r/b/x.txt"));
    left.increment("log", Path::new("/r/b/y.log"));

    let mut right = TypeRegistry::new();
    right.increment("txt", Path::new("/r/a/x.txt"));
    right.increment("md", Path::new("/r/a/readme.md"));

    let mut one = TypeRegistry::new();
    one.merge(left.clone());
    one.merge(right.clone());
    one.settle();

    let mut two = TypeRegistry::new();
    two.merge(right);
    two.merge(left);
    two.settle();

    assert_eq!(one.snapshot(), two.snapshot());
    assert_eq!(
        one.snapshot(),
        vec![
            ("md".to_string(), 1),
            ("txt".to_string(), 2),
            ("log".to_string(), 1),
        ]
    );
    assert_eq!(one.total(), 4);
}

#[test]
fn test_registry_is_case_sensitive() {
    let mut registry = TypeRegistry::new();
    registry.increment("txt", Path::new("/a.txt"));
    registry.increment("TXT", Path::new("/b.TXT"));

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("txt"), Some(1));
    assert_eq!(registry.get("TXT"), Some(1));
    assert_eq!(registry.get("Txt"), None);
}

#[test]
fn test_catalog_from_iter_and_sort() {
    let mut catalog: FileCatalog = ["/r/z", "/r/a/b", "/r/a.txt"]
        .into_iter()
        .map(|p| FileRecord::new(p, 1, None))
        .collect();
    catalog.sort_by_path();

    let paths: Vec<&Path> = catalog.iter().map(|r| r.path.as_path()).collect();
    // Component order puts the "a" directory before "a.txt".
    assert_eq!(
        paths,
        vec![Path::new("/r/a/b"), Path::new("/r/a.txt"), Path::new("/r/z")]
    );
    assert_eq!(catalog.total_bytes(), 3);
    assert!(catalog.get(Path::new("/r/z")).is_some());
}

#[test]
fn test_scan_config_builder() {
    let config = ScanConfig::builder()
        .root("/data")
        .threads(1usize)
        .include_hidden(false)
        .ignore_patterns(vec!["*.tmp".to_string()])
        .build()
        .unwrap();

    assert_eq!(config.root, PathBuf::from("/data"));
    assert_eq!(config.threads, 1);
    assert!(!config.include_hidden);
    assert_eq!(config.ignore_patterns, vec!["*.tmp"]);
    assert!(!config.compute_hashes);
}

#[test]
fn test_scan_error_messages_name_the_path() {
    let err = ScanError::unreadable(
        "/locked",
        std::io::Error::from(std::io::ErrorKind::PermissionDenied),
    );
    assert!(matches!(err, ScanError::DirectoryUnreadable { .. }));
    assert!(err.to_string().contains("/locked"));

    let warning = ScanWarning::stat_failed("/r/f", "gone");
    assert_eq!(warning.kind, WarningKind::StatFailed);
    assert_eq!(warning.path, PathBuf::from("/r/f"));
}
