use crate::theme::RenderPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Margin around the drawing, in device units. `None` derives it from
    /// the policy's default padding.
    pub padding: Option<f32>,
    /// Minimum output size; drawings smaller than this are centred.
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub font_family: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            padding: None,
            width: 0.0,
            height: 0.0,
            background: "#FFFFFF".to_string(),
            font_family: "Arial, Helvetica, sans-serif".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub policy: RenderPolicy,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let policy = RenderPolicy::default();
        let render = RenderConfig {
            background: policy.background.clone(),
            font_family: policy.font_family.clone(),
            ..Default::default()
        };
        Self { policy, render }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyValues {
    point_scale: Option<f32>,
    font_size: Option<f32>,
    line_size: Option<f32>,
    bond_sep: Option<f32>,
    default_padding: Option<f32>,
    foreground: Option<String>,
    background: Option<String>,
    font_family: Option<String>,
    atom_colors: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    padding: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    policy: Option<String>,
    policy_values: Option<PolicyValues>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(name) = parsed.policy.as_deref() {
        config.policy = RenderPolicy::by_name(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown render policy '{name}'"))?;
    }

    if let Some(vars) = parsed.policy_values {
        if let Some(v) = vars.point_scale {
            config.policy.point_scale = v;
        }
        if let Some(v) = vars.font_size {
            config.policy.font_size = v;
        }
        if let Some(v) = vars.line_size {
            config.policy.line_size = v;
        }
        if let Some(v) = vars.bond_sep {
            config.policy.bond_sep = v;
        }
        if let Some(v) = vars.default_padding {
            config.policy.default_padding = v;
        }
        if let Some(v) = vars.foreground {
            config.policy.foreground = v;
        }
        if let Some(v) = vars.background {
            config.policy.background = v;
        }
        if let Some(v) = vars.font_family {
            config.policy.font_family = v;
        }
        if let Some(colors) = vars.atom_colors {
            for (slot, color) in colors.into_iter().enumerate() {
                if let Some(existing) = config.policy.atom_colors.get_mut(slot) {
                    *existing = color;
                }
            }
        }
    }

    if let Some(render) = parsed.render {
        if render.padding.is_some() {
            config.render.padding = render.padding;
        }
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
    }

    if config.policy.point_scale <= 0.0 {
        anyhow::bail!("pointScale must be positive");
    }

    config.render.background = config.policy.background.clone();
    config.render.font_family = config.policy.font_family.clone();

    Ok(config)
}
