use anyhow::Result;
use reqwest::Client;
use serde::Serialize;

use crate::api::ApiUrls;
use crate::core::app_error::AppError;

#[derive(Serialize)]
struct OtpSms<'a> {
    phone: &'a str,
    message: String,
}

/// Hands an OTP to the SMS gateway. Without a configured gateway the code
/// only reaches the server log, which is enough for development.
pub async fn send_otp_sms(client: Client, phone: &str, code: &str, ttl_min: i64) -> Result<()> {
    let Some(url) = ApiUrls::get_sms_gateway_url() else {
        tracing::info!("[OTP] {phone} -> {code} (valid {ttl_min} min, no SMS gateway configured)");
        return Ok(());
    };

    client
        .post(format!("{url}/send"))
        .json(&OtpSms {
            phone,
            message: format!("Your verification code is {code}. Valid for {ttl_min} minutes."),
        })
        .send()
        .await
        .map_err(|_| AppError::ServiceUnreachable("SmsGateway".into()))?;

    Ok(())
}
