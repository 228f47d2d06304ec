use serde_json::json;
use serde_json::Value;

use crate::errors::ResponseTable;

/// Built-in configuration tree that caller overrides are merged onto.
pub fn default_tree() -> Value {
    json!({
        "jwt": {
            "secret": null,
            "options": {
                "algorithm": "HS256",
                "expires_in": "5m"
            },
            "use_encrypt": false,
            "use_blacklist": false,
            "extract": {
                "header": "authorization",
                "scheme": "Bearer"
            },
            "middleware": {
                "token_payload_key": "user"
            },
            "refresh": {
                "secret": null,
                "options": {
                    "algorithm": "HS256",
                    "expires_in": "1d"
                },
                "extract": {
                    "header": "x-refresh-token",
                    "scheme": null
                },
                "response_header": "authorization"
            },
            "blacklist": {
                "driver_name": "memory",
                "driver_params": {
                    "clear_expired_items_interval": "5m",
                    "clear_expired_items_interval_delay": null
                }
            }
        },
        "encryption": {
            "algorithm": "aes-256-cbc",
            "secret": null
        },
        "localization": {
            "responses": ResponseTable::english().to_value()
        }
    })
}
