#![no_main]
use libfuzzer_sys::fuzz_target;
use sshfs_mount::modules::target::{first_component, normalize_absolute, relative_suffix};

fuzz_target!(|data: &[u8]| {
    if let Ok(path) = std::str::from_utf8(data) {
        let absolute = normalize_absolute(&format!("/{}", path));

        // Normalized paths are absolute and free of empty, `.` and `..` parts
        assert!(absolute.starts_with('/'));
        assert!(absolute == "/" || !absolute.ends_with('/'));
        assert!(absolute[1..]
            .split('/')
            .all(|c| absolute == "/" || (!c.is_empty() && c != "." && c != "..")));
        assert_eq!(normalize_absolute(&absolute), absolute);

        // A path is its own existing root
        assert_eq!(relative_suffix(&format!("{}/", absolute), &absolute), "");

        // Every ancestor yields a plain relative suffix
        let mut ancestor = absolute.clone();
        while let Some(pos) = ancestor.rfind('/') {
            ancestor.truncate(pos);
            let suffix = relative_suffix(&format!("{}/", ancestor), &absolute);
            assert!(!suffix.starts_with('/'));
            assert!(!suffix.split('/').any(|c| c == ".."));
            assert!(absolute.ends_with(&suffix));
            assert!(!first_component(&suffix).contains('/'));
        }
    }
});
