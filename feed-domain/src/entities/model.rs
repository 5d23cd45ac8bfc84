// Runtime configuration shared across layers

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub data_dir: String,
    pub subscriptions_dir: String,
    pub systems_path: String,
    pub ship_groups_path: String,
    pub names_path: String,
    pub feed_url: String,
    pub feed_queue_id: String,
    pub reference_base_url: String,
    pub delivery_webhook_url: Option<String>,
    pub delivery_webhook_template: Option<String>,
    pub request_timeout_seconds: u64,
    pub dedupe_window_seconds: u64,
    pub max_body_bytes: u64,
}
