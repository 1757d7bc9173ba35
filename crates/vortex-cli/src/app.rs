//! Interactive front end state: the auth context plus the current location.

use std::io::{self, Write};

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

use vortex_core::api::{ApiClient, ApiRequest};
use vortex_core::auth::AuthContext;
use vortex_core::config::{Config, StorageBackend};
use vortex_core::routing::{self, Decision, View, LOGIN_PATH};
use vortex_core::storage::KeyValueStore;
use vortex_core::{AuthService, SessionStore};

use crate::input::{validate_username, Command};

/// Redirect hops followed before giving up on a navigation
const MAX_REDIRECTS: usize = 4;

type Context = AuthContext<ApiClient, Box<dyn KeyValueStore>>;

pub struct App {
    config: Config,
    auth: Context,
    pub location: String,
    /// Where a signed-out user was headed when sent to login.
    return_to: Option<String>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(config.api_base_url(), config.request_timeout())?;
        let store = config.open_store()?;
        debug!(base_url = %api.base_url(), storage = ?config.storage, "Backend configured");

        let auth = AuthContext::new(AuthService::new(api), SessionStore::new(store));

        Ok(Self {
            config,
            auth,
            location: LOGIN_PATH.to_string(),
            return_to: None,
        })
    }

    /// Rehydrate the session and land on the first view.
    pub fn start(&mut self) {
        self.auth.initialize();
        match self.auth.user() {
            Some(user) => println!("Welcome back, {} ({}).", user.name, user.role),
            None => println!("Not signed in. Type 'login' to sign in."),
        }
        self.go("/");
    }

    /// Run one command. Returns false when the user asked to quit.
    pub async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Help => println!("{}", crate::input::HELP),
            Command::Login(username) => self.login(username).await,
            Command::Logout => {
                self.auth.logout().await;
                self.return_to = None;
                println!("Signed out.");
                self.go(LOGIN_PATH);
            }
            Command::WhoAmI => self.whoami(),
            Command::Go(path) => self.go(&path),
            Command::Routes => self.routes(),
            Command::Get(path) => self.call(ApiRequest::get(path)).await,
            Command::Delete(path) => self.call(ApiRequest::delete(path)).await,
            Command::Post(path, body) => self.call(ApiRequest::post(path, body)).await,
            Command::Put(path, body) => self.call(ApiRequest::put(path, body)).await,
            Command::Signup(username) => self.signup(&username).await,
            Command::SetPassword(token) => self.set_password(&token).await,
            Command::Quit => return false,
        }
        true
    }

    /// Navigate, following redirects the guard and shells hand back.
    pub fn go(&mut self, location: &str) {
        let mut target = location.to_string();

        for _ in 0..=MAX_REDIRECTS {
            let Some(view) = View::resolve(&target) else {
                println!("No view at {}", target);
                return;
            };

            match routing::decide(view, &target, self.auth.state()) {
                Decision::Allow => {
                    self.location = view.path().to_string();
                    self.render(view);
                    return;
                }
                Decision::Pending => {
                    println!("Loading...");
                    return;
                }
                Decision::Redirect(redirect) => {
                    debug!(from = %target, to = %redirect.to, "Redirected");
                    if redirect.from.is_some() {
                        self.return_to = redirect.from;
                    }
                    target = redirect.to;
                }
            }
        }

        warn!(location, "Too many redirects");
        println!("Could not open {}", location);
    }

    fn render(&mut self, view: View) {
        if view == View::Login {
            if let Some(notice) = self.auth.take_notice() {
                println!(
                    "{} ({})",
                    notice.message,
                    notice.at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }
        println!("== {} ==  [{}]", view.title(), self.auth.display_name());
    }

    async fn login(&mut self, username: Option<String>) {
        let username = match username.or_else(|| self.prompt_username()) {
            Some(u) => u,
            None => return,
        };
        let password = match rpassword::prompt_password("Password: ") {
            Ok(p) => p,
            Err(e) => {
                println!("Could not read password: {}", e);
                return;
            }
        };

        match self.auth.login(&username, &password).await {
            Ok(role) => {
                println!("Signed in as {} ({}).", self.auth.display_name(), role);
                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                let target = self
                    .return_to
                    .take()
                    .unwrap_or_else(|| routing::home_for(&role).to_string());
                self.go(&target);
            }
            Err(e) => println!("{}", e),
        }
    }

    fn prompt_username(&self) -> Option<String> {
        let default = self.config.default_username();
        match default {
            Some(ref d) => print!("Username [{}]: ", d),
            None => print!("Username: "),
        }
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            return None;
        }
        let input = input.trim();
        let username = if input.is_empty() {
            default?
        } else {
            input.to_string()
        };
        if let Err(e) = validate_username(&username) {
            println!("{}", e);
            return None;
        }
        Some(username)
    }

    fn whoami(&self) {
        match self.auth.user() {
            Some(user) => {
                println!("username:    {}", user.username);
                println!("name:        {}", user.name);
                println!("role:        {}", user.role);
                if let Some(ref id) = user.employee_id {
                    println!("employee id: {}", id);
                }
            }
            None => println!("Not signed in."),
        }
    }

    fn routes(&self) {
        for view in View::ALL {
            let status = match routing::decide(view, view.path(), self.auth.state()) {
                Decision::Allow => "open".to_string(),
                Decision::Pending => "loading".to_string(),
                Decision::Redirect(r) => format!("-> {}", r.to),
            };
            println!("{:<20} {:<16} {}", view.path(), view.title(), status);
        }
    }

    async fn call(&mut self, request: ApiRequest) {
        let result = self.auth.request(&request).await;

        match result {
            Ok(Value::Null) => println!("OK"),
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(text) => println!("{}", text),
                Err(_) => println!("{}", value),
            },
            Err(e) => println!("{}", e),
        }

        if let Some(target) = self.auth.take_forced_redirect() {
            info!(path = %request.path, "Session ended by backend");
            self.return_to = Some(self.location.clone());
            self.go(&target);
        }
    }

    async fn signup(&mut self, username: &str) {
        let password = match prompt_secret("Password: ") {
            Some(p) => p,
            None => return,
        };
        match self.auth.service().signup(username, &password).await {
            Ok(_) => println!("Account created. Type 'login {}' to sign in.", username),
            Err(e) => println!("{}", e),
        }
    }

    async fn set_password(&mut self, token: &str) {
        let name = match self.auth.service().validate_invite(token).await {
            Ok(name) => name,
            Err(e) => {
                println!("{}", e);
                return;
            }
        };
        println!("Setting password for {}.", name);

        let Some(password) = prompt_secret("New password: ") else {
            return;
        };
        let Some(confirmation) = prompt_secret("Confirm password: ") else {
            return;
        };

        match self
            .auth
            .service()
            .set_password(token, &password, &confirmation)
            .await
        {
            Ok(()) => {
                println!("Password set. You can now sign in.");
                self.go(LOGIN_PATH);
            }
            Err(e) => println!("{}", e),
        }
    }

    pub fn prompt(&self) -> String {
        format!("vortex:{}> ", self.location)
    }

    pub fn uses_ephemeral_storage(&self) -> bool {
        self.config.storage == StorageBackend::Memory
    }
}

fn prompt_secret(label: &str) -> Option<String> {
    match rpassword::prompt_password(label) {
        Ok(p) => Some(p),
        Err(e) => {
            println!("Could not read password: {}", e);
            None
        }
    }
}
