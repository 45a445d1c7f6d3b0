pub mod sms;

pub struct ApiUrls {
    pub sms_gateway_url: Option<String>,
}

impl ApiUrls {
    pub fn init() -> Self {
        Self {
            sms_gateway_url: Self::get_sms_gateway_url(),
        }
    }

    pub fn get_sms_gateway_url() -> Option<String> {
        std::env::var("SMS_GATEWAY_URL").ok().filter(|v| !v.is_empty())
    }
}
