use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceImageRequest {
    /// Image value currently stored on the award (filename or URL), if any.
    pub previous_image: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ReplaceImageResponse {
    /// Value to store on the award.
    pub destination: String,
    /// Public URL of `destination`.
    pub url: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImageQuery {
    /// Stored image value (filename or URL)
    pub image: String,
}

#[derive(Serialize, ToSchema)]
pub struct ImageUrlResponse {
    pub url: String,
}
