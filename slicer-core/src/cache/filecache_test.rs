//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::cache::filecache::Filecache;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_dircache() {
    let dir = TempDir::new().unwrap();
    let cache = Filecache::new(dir.path());
    let path = "10/533/371.png";
    let fullpath = dir.path().join(path);
    let obj = "0123456789";

    // Cache miss
    assert_eq!(cache.read(path).unwrap(), None);
    assert!(!cache.exists(path));

    // Write into cache
    assert!(cache.write(path, obj.as_bytes()).unwrap());
    assert!(fullpath.exists());
    assert!(cache.exists(path));

    // Cache hit
    assert_eq!(cache.read(path).unwrap(), Some(obj.as_bytes().to_vec()));

    // Existing files are never replaced
    assert!(!cache.write(path, "other".as_bytes()).unwrap());
    assert_eq!(fs::read_to_string(&fullpath).unwrap(), obj);

    // No temporary files left behind
    let entries = fs::read_dir(fullpath.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    assert_eq!(entries, vec!["371.png".to_string()]);

    cache.remove(path).unwrap();
    assert!(!cache.exists(path));
}

#[test]
fn test_write_error() {
    let dir = TempDir::new().unwrap();
    // a file where the directory should be
    fs::write(dir.path().join("10"), "").unwrap();
    let cache = Filecache::new(dir.path());
    assert!(cache.write("10/533/371.png", b"data").is_err());
    assert!(!dir.path().join("10/533/371.png").exists());
}

#[test]
fn test_concurrent_writer() {
    let dir = TempDir::new().unwrap();
    let fullpath = dir.path().join("10/533/371.png");

    // another writer finishes between writing the temporary file and renaming it
    let tmp = Filecache::stage(&fullpath, b"late").unwrap();
    fs::write(&fullpath, "first").unwrap();
    assert!(!Filecache::commit(tmp, &fullpath).unwrap());
    assert_eq!(fs::read_to_string(&fullpath).unwrap(), "first");

    let entries = fs::read_dir(fullpath.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    assert_eq!(entries, vec!["371.png".to_string()]);
}
