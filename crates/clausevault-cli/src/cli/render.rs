use clausevault::model::{EntityKey, Library, Tenant, User};
use console::style;

pub fn render_tenant(tenant: &Tenant) -> String {
    let mut out = format!("{} {}\n", style("Tenant").bold(), tenant.tenant_id);
    if tenant.libraries.is_empty() {
        out.push_str("  (no libraries)\n");
    }
    for library in &tenant.libraries {
        out.push_str(&format!("  library {}\n", library.library_id));
    }
    out
}

pub fn render_library(library: &Library) -> String {
    format!(
        "{} {}\n  tenant {}\n",
        style("Library").bold(),
        library.library_id,
        library.tenant_id
    )
}

pub fn render_user(user: &User) -> String {
    let mut out = format!("{} {}\n", style("User").bold(), user.user_id);

    let tenant_state = if user.tenant.is_some() { "" } else { " (missing)" };
    out.push_str(&format!("  tenant {}{}\n", user.tenant_id, tenant_state));

    match (&user.default_library_id, &user.default_library) {
        (Some(id), Some(_)) => out.push_str(&format!("  default library {}\n", id)),
        (Some(id), None) => out.push_str(&format!("  default library {} (missing)\n", id)),
        (None, _) => out.push_str("  default library (none)\n"),
    }

    let token = if user.refresh_token.is_empty() {
        "(none)"
    } else {
        "(stored)"
    };
    out.push_str(&format!("  refresh token {}\n", token));
    out
}

pub fn render_saved(action: &str, key: &EntityKey) -> String {
    format!("{} {}", style(action).green(), key)
}
