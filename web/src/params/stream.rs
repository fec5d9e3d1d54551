use domain::{SessionParameters, StreamDefaults};
use std::collections::HashMap;
use utoipa::IntoParams;

/// Raw query parameters of `GET /api/stream_weather`.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct StreamParams {
    /// Latitude. Defaults to 23.8103 when absent or not a number.
    #[param(example = "51.5")]
    pub(crate) lat: Option<String>,
    /// Longitude. Defaults to 90.4125 when absent or not a number.
    #[param(example = "-0.1")]
    pub(crate) lon: Option<String>,
    /// Poll period in whole seconds. Defaults to 30, never below 10.
    #[param(example = "30")]
    pub(crate) interval: Option<String>,
    /// Timezone forwarded to the upstream provider, e.g. `Asia/Dhaka`.
    pub(crate) timezone: Option<String>,
}

impl StreamParams {
    /// Picks the recognized keys out of a raw query map; anything else is ignored.
    pub(crate) fn from_query(query: &HashMap<String, String>) -> Self {
        Self {
            lat: query.get("lat").cloned(),
            lon: query.get("lon").cloned(),
            interval: query.get("interval").cloned(),
            timezone: query.get("timezone").cloned(),
        }
    }

    pub(crate) fn into_session_parameters(self, defaults: &StreamDefaults) -> SessionParameters {
        SessionParameters::normalize(
            self.lat.as_deref(),
            self.lon.as_deref(),
            self.interval.as_deref(),
            self.timezone.as_deref(),
            defaults,
        )
    }
}
