//! Built-in household tools
//!
//! Local skills that answer immediately. Real deployments replace them with
//! handlers that call the smart-home or music provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ToolHandler, ToolRegistry};
use crate::intent::Parameters;
use crate::{Error, Result};

/// Register every built-in tool with its schema
pub fn register_builtin_tools(registry: &ToolRegistry) {
    registry.register_with_schema(
        "smart_home.set_scene",
        object_schema(&[("scene", true), ("room", true)]),
        Arc::new(SetSceneTool),
    );
    registry.register_with_schema(
        "music_player.play",
        object_schema(&[("artist", false), ("genre", false)]),
        Arc::new(PlayMusicTool),
    );
    registry.register_with_schema(
        "general.chat",
        object_schema(&[("message", true)]),
        Arc::new(ChatTool),
    );
    registry.register_with_schema(
        "light_control",
        object_schema(&[("action", false), ("target", false)]),
        Arc::new(LightControlTool),
    );
    registry.register_with_schema(
        "volume_control",
        object_schema(&[("action", false), ("value", false)]),
        Arc::new(VolumeControlTool),
    );
    registry.register_with_schema("get_time", object_schema(&[]), Arc::new(GetTimeTool));
}

/// Set a lighting scene in a room
#[derive(Debug, Clone, Copy, Default)]
pub struct SetSceneTool;

#[async_trait]
impl ToolHandler for SetSceneTool {
    async fn invoke(&self, parameters: &Parameters) -> Result<Parameters> {
        let scene = required(parameters, "scene")?;
        let room = required(parameters, "room")?;
        Ok(success(
            "smart_home.set_scene",
            format!("已将 {room} 灯光调成 {scene} 模式"),
        ))
    }
}

/// Start music playback
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayMusicTool;

#[async_trait]
impl ToolHandler for PlayMusicTool {
    async fn invoke(&self, parameters: &Parameters) -> Result<Parameters> {
        let what = optional(parameters, "genre")
            .or_else(|| optional(parameters, "artist"))
            .unwrap_or("推荐");
        Ok(success("music_player.play", format!("正在播放 {what} 音乐")))
    }
}

/// Acknowledge a free-form message
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatTool;

#[async_trait]
impl ToolHandler for ChatTool {
    async fn invoke(&self, parameters: &Parameters) -> Result<Parameters> {
        required(parameters, "message")?;
        Ok(success("general.chat", "已收到".to_string()))
    }
}

/// Switch a light on or off
#[derive(Debug, Clone, Copy, Default)]
pub struct LightControlTool;

#[async_trait]
impl ToolHandler for LightControlTool {
    async fn invoke(&self, parameters: &Parameters) -> Result<Parameters> {
        let action = optional(parameters, "action").unwrap_or("on");
        let target = optional(parameters, "target").unwrap_or("灯");
        let verb = match action {
            "on" => "打开",
            "off" => "关闭",
            other => other,
        };
        Ok(success("light_control", format!("已{verb}{target}")))
    }
}

/// Set the speaker volume
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeControlTool;

#[async_trait]
impl ToolHandler for VolumeControlTool {
    async fn invoke(&self, parameters: &Parameters) -> Result<Parameters> {
        let value = optional(parameters, "value").unwrap_or("50");
        let level: u8 = value
            .parse()
            .map_err(|_| Error::Tool(format!("invalid volume: {value}")))?;
        if level > 100 {
            return Err(Error::Tool(format!("volume out of range: {level}")));
        }
        Ok(success("volume_control", format!("音量已设置为{level}%")))
    }
}

/// Report the local time
#[derive(Debug, Clone, Copy, Default)]
pub struct GetTimeTool;

#[async_trait]
impl ToolHandler for GetTimeTool {
    async fn invoke(&self, _parameters: &Parameters) -> Result<Parameters> {
        let now = chrono::Local::now().format("%H:%M");
        Ok(success("get_time", format!("现在是{now}")))
    }
}

fn success(tool: &str, message: String) -> Parameters {
    let mut output = Parameters::new();
    output.insert("tool".to_string(), Value::from(tool));
    output.insert("status".to_string(), Value::from("success"));
    output.insert("message".to_string(), Value::from(message));
    output
}

fn optional<'a>(parameters: &'a Parameters, key: &str) -> Option<&'a str> {
    parameters.get(key).and_then(Value::as_str)
}

fn required<'a>(parameters: &'a Parameters, key: &str) -> Result<&'a str> {
    optional(parameters, key).ok_or_else(|| Error::Tool(format!("missing parameter: {key}")))
}

fn object_schema(fields: &[(&str, bool)]) -> Value {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(name, _)| ((*name).to_string(), json!({"type": "string"})))
        .collect();
    let required: Vec<&str> = fields
        .iter()
        .filter(|(_, required)| *required)
        .map(|(name, _)| *name)
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
