//! Function-calling schema offered to the model on every ruling.
//!
//! Arguments use the long names (`player_name`, `resource_name`); the decoder
//! also accepts the short forms.

use rulewarden_domain::tools::{
    APPLY_GLOBAL_EFFECT, APPLY_STATUS_EFFECT, NEXT_ROUND, REMOVE_GLOBAL_EFFECT,
    REMOVE_STATUS_EFFECT, UPDATE_PLAYER_HP, UPDATE_PLAYER_MP, UPDATE_PLAYER_RESOURCE,
};
use serde_json::json;

use crate::infrastructure::ports::ToolDefinition;

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: UPDATE_PLAYER_HP.to_string(),
            description: "Change a player's health. Use a negative delta for damage and a \
                          positive delta for healing. Health is clamped to 0..max."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "player_name": {"type": "string", "description": "Exact name of the target player"},
                    "delta": {"type": "integer", "description": "Health change; negative for damage"},
                    "reason": {"type": "string", "description": "Why, e.g. 'hit by a Strike card'"}
                },
                "required": ["player_name", "delta", "reason"]
            }),
        },
        ToolDefinition {
            name: APPLY_STATUS_EFFECT.to_string(),
            description: "Give a player a status effect such as poisoned, stunned, or shielded."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "player_name": {"type": "string", "description": "Exact name of the target player"},
                    "effect": {"type": "string", "description": "Effect label, e.g. 'poisoned'"}
                },
                "required": ["player_name", "effect"]
            }),
        },
        ToolDefinition {
            name: REMOVE_STATUS_EFFECT.to_string(),
            description: "Remove a status effect from a player.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "player_name": {"type": "string", "description": "Exact name of the target player"},
                    "effect": {"type": "string", "description": "Effect label to remove"}
                },
                "required": ["player_name", "effect"]
            }),
        },
        ToolDefinition {
            name: UPDATE_PLAYER_RESOURCE.to_string(),
            description: "Change how much of a resource (gold, wood, cards) a player holds. \
                          Positive delta to gain, negative to spend."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "player_name": {"type": "string", "description": "Exact name of the target player"},
                    "resource_name": {"type": "string", "description": "Resource name, e.g. 'gold'"},
                    "delta": {"type": "integer", "description": "Quantity change"},
                    "reason": {"type": "string", "description": "Why the quantity changed"}
                },
                "required": ["player_name", "resource_name", "delta", "reason"]
            }),
        },
        ToolDefinition {
            name: NEXT_ROUND.to_string(),
            description: "End the current player's turn. Only call when the turn should pass."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "next_player": {
                        "type": "string",
                        "description": "Player who acts next; omit to rotate in seat order"
                    }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: UPDATE_PLAYER_MP.to_string(),
            description: "Change a player's mana. Negative delta to spend, positive to restore. \
                          Only players listed with MP have mana; it is clamped to 0..max."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "player_name": {"type": "string", "description": "Exact name of the target player"},
                    "delta": {"type": "integer", "description": "Mana change; negative to spend"},
                    "reason": {"type": "string", "description": "Why, e.g. 'cast Fireball'"}
                },
                "required": ["player_name", "delta", "reason"]
            }),
        },
        ToolDefinition {
            name: APPLY_GLOBAL_EFFECT.to_string(),
            description: "Start an effect that applies to the whole table, such as a weather \
                          or board condition."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "effect": {"type": "string", "description": "Effect label, e.g. 'blood moon'"}
                },
                "required": ["effect"]
            }),
        },
        ToolDefinition {
            name: REMOVE_GLOBAL_EFFECT.to_string(),
            description: "End an effect that applies to the whole table.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "effect": {"type": "string", "description": "Effect label to remove"}
                },
                "required": ["effect"]
            }),
        },
    ]
}
