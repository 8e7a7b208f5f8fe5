use async_trait::async_trait;
use reqwest::StatusCode;
use smartblinds_api::protocol::{
    CommandAck, CommandReply, DeviceStatus, MoveCommand, MoveStepsCommand, StatusReply, SystemInfo,
};
use tracing::debug;

use crate::configs::Http;
use crate::errors::DeviceError;

/// HTTP surface exposed by the blind firmware.
#[async_trait]
pub trait BlindDevice: Send + Sync {
    /// `GET /status`. Only a 200 response with a JSON body is a status.
    async fn status(&self) -> Result<DeviceStatus, DeviceError>;

    /// `PUT /move`. A 2xx response still carries a `msg` telling whether the
    /// firmware took the command.
    async fn move_to(&self, command: &MoveCommand) -> Result<CommandAck, DeviceError>;

    /// `PUT /unsafe_move`. Relative move, allowed on an uncalibrated device.
    async fn move_steps(&self, command: &MoveStepsCommand) -> Result<CommandAck, DeviceError>;

    /// `PUT /reset_state`. Drops the device calibration.
    async fn reset_state(&self) -> Result<CommandAck, DeviceError>;

    /// `GET /system_info`.
    async fn system_info(&self) -> Result<SystemInfo, DeviceError>;
}

pub struct HttpBlindDevice {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBlindDevice {
    pub fn new(host: &str, http: &Http) -> Result<Self, DeviceError> {
        let http_client = reqwest::Client::builder()
            .timeout(http.timeout())
            .connect_timeout(http.connect_timeout())
            .build()
            .map_err(DeviceError::ClientBuild)?;

        Ok(Self {
            http_client,
            base_url: format!("http://{host}"),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, DeviceError> {
        let url = self.url(path);
        let response = self.http_client.get(&url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(DeviceError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| DeviceError::Decode { url, source })
    }

    async fn put_json<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&T>,
    ) -> Result<CommandAck, DeviceError> {
        let url = self.url(path);
        let request = self.http_client.put(&url);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(DeviceError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        let reply = match serde_json::from_slice::<CommandReply>(&body) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(url = %url, "Unparsed command reply: {}", e);
                CommandReply::default()
            }
        };

        Ok(reply.into())
    }
}

#[async_trait]
impl BlindDevice for HttpBlindDevice {
    async fn status(&self) -> Result<DeviceStatus, DeviceError> {
        let reply: StatusReply = self.get_json("status").await?;
        Ok(reply.into())
    }

    async fn move_to(&self, command: &MoveCommand) -> Result<CommandAck, DeviceError> {
        self.put_json("move", Some(command)).await
    }

    async fn move_steps(&self, command: &MoveStepsCommand) -> Result<CommandAck, DeviceError> {
        self.put_json("unsafe_move", Some(command)).await
    }

    async fn reset_state(&self) -> Result<CommandAck, DeviceError> {
        self.put_json::<()>("reset_state", None).await
    }

    async fn system_info(&self) -> Result<SystemInfo, DeviceError> {
        self.get_json("system_info").await
    }
}
