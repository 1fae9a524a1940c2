use gatehouse_auth::Authenticator;

#[derive(Clone)]
pub struct AppState {
    authenticator: Authenticator,
}

impl AppState {
    pub fn new(authenticator: Authenticator) -> Self {
        Self { authenticator }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }
}
