use super::*;

#[test]
fn env_parse_missing_returns_default() {
    let val: usize = env_parse("__DANMAKU_TEST_MISSING_KEY__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_invalid_returns_default() {
    unsafe { std::env::set_var("__DANMAKU_TEST_INVALID__", "lots") };
    let val: usize = env_parse("__DANMAKU_TEST_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__DANMAKU_TEST_INVALID__") };
}

#[test]
fn default_config_targets_public_endpoint() {
    let config = SessionConfig::default();
    assert_eq!(config.endpoint, "wss://broadcastlv.chat.bilibili.com/sub");
    assert_eq!(config.sink_capacity, DEFAULT_SINK_CAPACITY);
}

// Env-reading assertions share one test so they never race each other.
#[test]
fn from_env_reads_overrides_and_falls_back() {
    unsafe {
        std::env::remove_var("DANMAKU_ENDPOINT");
        std::env::remove_var("DANMAKU_SINK_CAPACITY");
        std::env::remove_var("DANMAKU_API_BASE_URL");
    }
    assert_eq!(SessionConfig::from_env(), SessionConfig::default());
    assert_eq!(api_base_url_from_env(), DEFAULT_API_BASE_URL);

    unsafe {
        std::env::set_var("DANMAKU_ENDPOINT", "ws://127.0.0.1:9001/sub");
        std::env::set_var("DANMAKU_SINK_CAPACITY", "8");
        std::env::set_var("DANMAKU_API_BASE_URL", "http://127.0.0.1:9002");
    }
    let config = SessionConfig::from_env();
    assert_eq!(config.endpoint, "ws://127.0.0.1:9001/sub");
    assert_eq!(config.sink_capacity, 8);
    assert_eq!(api_base_url_from_env(), "http://127.0.0.1:9002");

    unsafe { std::env::set_var("DANMAKU_ENDPOINT", "") };
    assert_eq!(SessionConfig::from_env().endpoint, DEFAULT_ENDPOINT);

    unsafe {
        std::env::remove_var("DANMAKU_ENDPOINT");
        std::env::remove_var("DANMAKU_SINK_CAPACITY");
        std::env::remove_var("DANMAKU_API_BASE_URL");
    }
}

#[test]
fn zero_capacity_channel_is_clamped() {
    let config = SessionConfig {
        endpoint: DEFAULT_ENDPOINT.to_owned(),
        sink_capacity: 0,
    };
    let (tx, _rx) = config.channel();
    assert_eq!(tx.max_capacity(), 1);
}
