//! Test fixtures for runserver integration tests

use std::time::Duration;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const SUITE: &'static str = "acceptance";
    pub const HOSTNAME: &'static str = "127.0.0.1";

    /// Polling fast enough to keep the suites quick
    pub const SLEEP: Duration = Duration::from_millis(50);
    pub const RETRIES: u32 = 20;

    /// Fake drush: records its arguments and env, then idles until signalled
    pub const FAKE_DRUSH: &'static str = r#"echo "pid: $$"
echo "args: $*"
echo "site: $SITE_NAME"
echo "starting fake server" >&2
exec sleep 30
"#;
}
