use serde::Serialize;

use crate::normalize::profile::FieldProfile;

#[derive(Serialize)]
pub struct ProfileInfo {
    pub name: String,
    pub is_default: bool,
    pub fields: Vec<FieldInfo>,
    pub diagnostic: String,
}

#[derive(Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub default: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl ProfileInfo {
    pub fn new(profile: &FieldProfile, is_default: bool) -> Self {
        Self {
            name: profile.name.clone(),
            is_default,
            fields: profile
                .fields
                .iter()
                .map(|f| FieldInfo {
                    name: f.name.clone(),
                    default: f.default.clone(),
                    aliases: f.aliases.clone(),
                })
                .collect(),
            diagnostic: format!("{} = \"{}\"", profile.diagnostic_field, profile.diagnostic_value),
        }
    }
}

#[derive(Serialize)]
pub struct ProfilesResponse {
    pub profiles: Vec<ProfileInfo>,
}

impl ProfilesResponse {
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for profile in &self.profiles {
            let marker = if profile.is_default { " (default)" } else { "" };
            out.push_str(&format!("### {}{marker}\n", profile.name));
            out.push_str(&format!("On parse failure: {}\n\n", profile.diagnostic));
            out.push_str("| field | default | aliases |\n|---|---|---|\n");
            for field in &profile.fields {
                let default = if field.default.is_empty() {
                    "(empty)".to_string()
                } else {
                    format!("`{}`", field.default)
                };
                out.push_str(&format!(
                    "| {} | {} | {} |\n",
                    field.name,
                    default,
                    field.aliases.join(", ")
                ));
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}
