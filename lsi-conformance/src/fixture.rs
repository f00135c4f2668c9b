//! Canonical sources every host adapter is checked against.
//!
//! Each source parses cleanly with both `syn` and tree-sitter, so the three
//! hosts see equivalent declarations.

/// Accounts with documentation, repeated annotations, an inline module, an
/// inherent impl and a trait impl.
pub const ACCOUNTS: &str = r#"use std::collections::HashMap;

/// A registered account.
#[table(name = "sys_user")]
#[index(columns = "email")]
#[index(columns = "name, email", unique = true)]
pub struct User {
    /// Primary key.
    #[column("user_id")]
    pub id: u64,
    pub name: String,
    pub email: Option<String>,
    pub roles: Vec<Role>,
    pub history: HashMap<String, audit::Stamp>,
}

pub enum Role {
    Admin,
    Member(u32),
    Suspended { reason: String },
}

impl User {
    /// Creates an account without roles.
    pub fn new(id: u64, name: String) -> Self {
        User {
            id,
            name,
            email: None,
            roles: Vec::new(),
            history: HashMap::new(),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.name
    }

    pub fn grant(&mut self, role: Role) {
        self.roles.push(role);
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

pub mod audit {
    pub struct Stamp {
        pub at: i64,
        pub by: super::User,
    }
}
"#;

/// One struct and one enum with every variant shape.
pub const SHAPES: &str = r#"pub struct Point {
    pub x: i32,
}

pub enum Shape {
    Empty,
    Circle(f64),
    Rect { w: f64, h: f64 },
}
"#;

/// A field whose type no host can find.
pub const DANGLING: &str = r#"pub struct Order {
    pub total: u64,
    pub buyer: Customer,
}
"#;
