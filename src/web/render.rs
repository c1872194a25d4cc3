//! HTML pages.
//!
//! Templates live in `templates/` and are compiled on first use. Their names
//! end in `.html`, so minijinja escapes every interpolated value.

use crate::store::UserRecord;
use lazy_static::lazy_static;
use minijinja::{context, Environment, Error};
use serde::Serialize;

lazy_static! {
    static ref PAGES: Environment<'static> = {
        let mut env = Environment::new();
        env.set_loader(load_template);
        env
    };
}

fn load_template(name: &str) -> Result<Option<String>, Error> {
    let source = match name {
        "layout.html" => include_str!("templates/layout.html"),
        "logout_form.html" => include_str!("templates/logout_form.html"),
        "index.html" => include_str!("templates/index.html"),
        "login.html" => include_str!("templates/login.html"),
        "user.html" => include_str!("templates/user.html"),
        "admin.html" => include_str!("templates/admin.html"),
        "error.html" => include_str!("templates/error.html"),
        _ => return Ok(None),
    };
    Ok(Some(source.to_string()))
}

fn render<S: Serialize>(name: &str, ctx: S) -> Result<String, Error> {
    PAGES.get_template(name)?.render(ctx)
}

/// One row of the admin table. The password digest never reaches a template.
#[derive(Serialize)]
struct UserRow<'a> {
    id: &'a str,
    user_id: &'a str,
    full_name: &'a str,
}

impl<'a> From<&'a UserRecord> for UserRow<'a> {
    fn from(r: &'a UserRecord) -> Self {
        Self {
            id: r.id.as_str(),
            user_id: &r.user_id,
            full_name: &r.full_name,
        }
    }
}

pub fn index() -> Result<String, Error> {
    render("index.html", context! {})
}

pub fn login(message: Option<&str>) -> Result<String, Error> {
    render("login.html", context! { message })
}

pub fn user(record: &UserRecord) -> Result<String, Error> {
    render(
        "user.html",
        context! {
            full_name => &record.full_name,
            user_id => &record.user_id,
            roles => &record.roles,
        },
    )
}

pub fn admin(current: &UserRecord, records: &[UserRecord]) -> Result<String, Error> {
    let rows: Vec<UserRow<'_>> = records.iter().map(UserRow::from).collect();
    render(
        "admin.html",
        context! {
            current => &current.full_name,
            rows,
        },
    )
}

pub fn error(message: &str) -> Result<String, Error> {
    render("error.html", context! { message })
}
