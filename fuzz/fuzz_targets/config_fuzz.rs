#![no_main]
use libfuzzer_sys::fuzz_target;
use sshfs_mount::modules::config::parse_id_pair;
use sshfs_mount::MountConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Parsing must never panic, whatever the input
        let _ = serde_json::from_str::<MountConfig>(text);

        if let Ok((host, remote)) = parse_id_pair(text) {
            assert_eq!(parse_id_pair(&format!("{}:{}", host, remote)), Ok((host, remote)));
        }
    }
});
