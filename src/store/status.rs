use serde::Serialize;

/// Connection lifecycle as reported by `/health`, using the numeric codes
/// document-store drivers expose as `readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Connecting,
    Disconnecting,
}

impl ConnectionState {
    pub fn code(&self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connected => 1,
            ConnectionState::Connecting => 2,
            ConnectionState::Disconnecting => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub state: u8,
    pub host: String,
    pub name: String,
}

impl ConnectionStatus {
    pub fn new(state: ConnectionState, host: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            connected: state == ConnectionState::Connected,
            state: state.code(),
            host: host.into(),
            name: name.into(),
        }
    }
}
