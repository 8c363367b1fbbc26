pub struct ErrorCode;

impl ErrorCode {
    // Config errors: C1xx
    pub const CONFIG_READ_FAILED: &'static str = "C100";
    pub const CONFIG_PARSE_FAILED: &'static str = "C101";

    // Docker errors: D1xx
    pub const DOCKER_CONTAINER_NOT_FOUND: &'static str = "D100";
    pub const DOCKER_QUERY_FAILED: &'static str = "D101";
    pub const DOCKER_CONNECTION_FAILED: &'static str = "D102";
    pub const DOCKER_ACTION_FAILED: &'static str = "D103";

    // Render sink errors: R1xx
    pub const RENDER_MESSAGE_GONE: &'static str = "R100";
    pub const RENDER_EDIT_FAILED: &'static str = "R101";
}
