use file_bundle::{
    BundleEntry, BundleError, list_bytes, pack_to_file, pack_to_memory, unpack,
    unpack_bytes_to_dir, unpack_bytes_to_memory, unpack_file_to_dir, unpack_file_to_memory,
    unpack_to_dir,
};
use std::fs;
use tempfile::tempdir;

fn sample_files() -> Vec<BundleEntry> {
    vec![
        BundleEntry::new("readme.txt", b"Hello, bundle!".to_vec()),
        BundleEntry::new("empty.dat", Vec::new()),
        BundleEntry::new("nested/deeper/blob.bin", (0..=255u8).cycle().take(70_000).collect()),
        BundleEntry::new("windows\\style.ini", b"[section]\nkey=value\n".to_vec()),
    ]
}

fn expected_len(files: &[BundleEntry]) -> u64 {
    24 + files.iter().map(|f| f.name.len() as u64 + 1).sum::<u64>()
        + 8 * files.len() as u64
        + files.iter().map(|f| f.size).sum::<u64>()
}

fn strip_bytes(files: &[BundleEntry]) -> Vec<BundleEntry> {
    files
        .iter()
        .map(|f| BundleEntry::with_size(f.name.clone(), f.size))
        .collect()
}

#[test]
fn memory_to_memory() {
    let files = sample_files();
    let bundle = pack_to_memory(&files).unwrap();

    assert_eq!(bundle.name, "");
    assert_eq!(bundle.size, expected_len(&files));
    assert_eq!(bundle.bytes.len() as u64, bundle.size);

    assert_eq!(unpack_bytes_to_memory(&bundle.bytes).unwrap(), files);
    assert_eq!(unpack(&bundle).unwrap(), files);
}

#[test]
fn memory_to_disk_archive_and_back() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("bundle.bin");
    let files = sample_files();

    let summary = pack_to_file(&archive, &files).unwrap();
    assert_eq!(summary.name, archive.to_string_lossy());
    assert_eq!(summary.size, expected_len(&files));
    assert!(summary.bytes.is_empty());
    assert_eq!(fs::metadata(&archive).unwrap().len(), summary.size);

    assert_eq!(unpack_file_to_memory(&archive).unwrap(), files);
    assert_eq!(unpack(&summary).unwrap(), files);
}

#[test]
fn disk_archive_to_disk_files() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("bundle.bin");
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();
    let files = sample_files();

    pack_to_file(&archive, &files).unwrap();
    let unpacked = unpack_file_to_dir(&archive, &out).unwrap();
    assert_eq!(unpacked, strip_bytes(&files));

    assert_eq!(fs::read(out.join("readme.txt")).unwrap(), files[0].bytes);
    assert_eq!(fs::read(out.join("empty.dat")).unwrap(), b"");
    assert_eq!(
        fs::read(out.join("nested").join("deeper").join("blob.bin")).unwrap(),
        files[2].bytes
    );
    assert_eq!(
        fs::read(out.join("windows").join("style.ini")).unwrap(),
        files[3].bytes
    );
}

#[test]
fn memory_archive_to_disk_files() {
    let dir = tempdir().unwrap();
    let files = sample_files();
    let bundle = pack_to_memory(&files).unwrap();

    let unpacked = unpack_bytes_to_dir(&bundle.bytes, dir.path()).unwrap();
    assert_eq!(unpacked, strip_bytes(&files));
    assert_eq!(fs::read(dir.path().join("readme.txt")).unwrap(), files[0].bytes);

    let other = tempdir().unwrap();
    unpack_to_dir(&bundle, other.path()).unwrap();
    assert_eq!(
        fs::read(other.path().join("nested/deeper/blob.bin")).unwrap(),
        files[2].bytes
    );
}

#[test]
fn empty_input() {
    let bundle = pack_to_memory(&[]).unwrap();
    assert_eq!(bundle.size, 24);
    assert_eq!(bundle.bytes, vec![0u8; 24]);
    assert!(unpack(&bundle).unwrap().is_empty());
    assert!(list_bytes(&bundle.bytes).unwrap().is_empty());
}

#[test]
fn single_zero_length_file() {
    let files = vec![BundleEntry::new("nothing", Vec::new())];
    let bundle = pack_to_memory(&files).unwrap();

    assert_eq!(bundle.size, 24 + 8 + 8);
    assert_eq!(&bundle.bytes[24..32], b"nothing\0");
    assert_eq!(&bundle.bytes[32..40], &[0u8; 8]);

    let unpacked = unpack(&bundle).unwrap();
    assert_eq!(unpacked.len(), 1);
    assert_eq!(unpacked[0].size, 0);
    assert!(unpacked[0].bytes.is_empty());
}

#[test]
fn listing_reports_names_and_sizes() {
    let files = sample_files();
    let bundle = pack_to_memory(&files).unwrap();
    assert_eq!(list_bytes(&bundle.bytes).unwrap(), strip_bytes(&files));
}

#[test]
fn summary_without_bytes_or_path_unpacks_nothing() {
    let summary = BundleEntry::default();
    assert!(unpack(&summary).unwrap().is_empty());

    let dir = tempdir().unwrap();
    assert!(unpack_to_dir(&summary, dir.path()).unwrap().is_empty());
}

#[test]
fn truncated_bundle_is_reported() {
    let bundle = pack_to_memory(&sample_files()).unwrap();

    for cut in [0, 10, 30, bundle.bytes.len() - 1] {
        let err = unpack_bytes_to_memory(&bundle.bytes[..cut]).unwrap_err();
        let kind = err.downcast_ref::<BundleError>().unwrap();
        assert!(kind.is_malformed(), "cut at {cut}: {kind}");
    }
}

#[test]
fn invalid_names_are_rejected() {
    for name in ["", "has\0nul"] {
        let err = pack_to_memory(&[BundleEntry::new(name, b"x".to_vec())]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BundleError>(),
            Some(BundleError::InvalidName { .. })
        ));
    }
}
