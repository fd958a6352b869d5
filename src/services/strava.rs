use super::{from_object, parse_items, RawId};
use crate::authorized_client::{AuthorizedClient, Endpoints, GrantFlow, QueryParams, TokenPlacement};
use crate::error::{Error, Result};
use crate::records::{
    parse_http_url, parse_utc_timestamp, AssociatedMedia, BaseVertical, PhysicalActivity,
    PostStatus, SocialPosting,
};
use crate::service::{
    check_count, merge_params, Fetched, FetcherTable, Parsed, ServiceCore, TransferService,
};
use crate::settings::Settings;
use crate::transport::{ReqwestTransport, Transport};
use crate::vertical::Vertical;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const SERVICE_NAME: &str = "Strava";
const ACTIVITY_URL: &str = "https://www.strava.com/activities";
const MAX_ACTIVITIES: usize = 30;
const ACTIVITY_SCOPE: [&str; 2] = ["activity:read", "profile:read_all"];

const ENDPOINTS: Endpoints = Endpoints {
    authorization_url: "https://www.strava.com/oauth/authorize",
    token_url: Some("https://www.strava.com/oauth/token"),
    base_url: "https://www.strava.com/api/v3",
    flow: GrantFlow::AuthorizationCode,
    token_placement: TokenPlacement::BearerHeader,
    scope_delimiter: ",",
};

/// Transfers the activities of a Strava athlete.
///
/// See <https://developers.strava.com/docs/reference/>.
pub struct StravaTransferService {
    core: ServiceCore,
    fetchers: FetcherTable<Self>,
}

impl StravaTransferService {
    pub fn new(settings: Settings) -> Result<Self> {
        Self::with_transport(settings, Box::new(ReqwestTransport::new()?))
    }

    pub fn with_transport(settings: Settings, transport: Box<dyn Transport>) -> Result<Self> {
        settings.require_client_secret(SERVICE_NAME)?;

        let mut fetchers: FetcherTable<Self> = BTreeMap::new();
        fetchers.insert(Vertical::PhysicalActivity, |service, request| {
            service
                .fetch_physical_activity_vertical(&request.params, request.count)
                .map(Fetched::from)
        });
        fetchers.insert(Vertical::SocialPosting, |service, request| {
            service
                .fetch_social_posting_vertical(&request.params, request.count)
                .map(Fetched::from)
        });

        let client = AuthorizedClient::new(ENDPOINTS, &settings, transport)?;
        let core = ServiceCore::new(
            SERVICE_NAME,
            fetchers.keys().copied().collect(),
            settings.verticals.iter().copied(),
            client,
        )?;
        let mut service = StravaTransferService { core, fetchers };
        service.reset_scope()?;
        Ok(service)
    }

    /// Activities of the authenticated athlete, at most 30 per request.
    pub fn fetch_physical_activity_vertical(
        &mut self,
        params: &QueryParams,
        count: Option<usize>,
    ) -> Result<Parsed<PhysicalActivity>> {
        let raw = self.fetch_activities(params, count)?;
        let records = parse_items(activity_list(&raw)?, parse_physical_activity);
        Ok((records, raw))
    }

    /// The same activities as [`Self::fetch_physical_activity_vertical`], seen as
    /// social postings.
    pub fn fetch_social_posting_vertical(
        &mut self,
        params: &QueryParams,
        count: Option<usize>,
    ) -> Result<Parsed<SocialPosting>> {
        let raw = self.fetch_activities(params, count)?;
        let records = parse_items(activity_list(&raw)?, parse_social_posting);
        Ok((records, raw))
    }

    fn fetch_activities(&mut self, params: &QueryParams, count: Option<usize>) -> Result<Value> {
        let count = count.unwrap_or(MAX_ACTIVITIES);
        check_count(SERVICE_NAME, count, MAX_ACTIVITIES, "activities")?;
        self.get_resource_from_path(
            "athlete/activities",
            merge_params(&[("per_page", count.to_string())], params),
        )
    }
}

impl TransferService for StravaTransferService {
    fn core(&self) -> &ServiceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ServiceCore {
        &mut self.core
    }

    fn scope_for_verticals(&self, verticals: &BTreeSet<Vertical>) -> Result<BTreeSet<String>> {
        self.core.ensure_supported(verticals)?;
        let mut scope = BTreeSet::new();
        for vertical in verticals {
            if let Vertical::PhysicalActivity | Vertical::SocialPosting = vertical {
                scope.extend(ACTIVITY_SCOPE.iter().map(|scope| scope.to_string()));
            }
        }
        Ok(scope)
    }

    fn fetchers(&self) -> &FetcherTable<Self> {
        &self.fetchers
    }

    fn includes_client_id(&self) -> bool {
        true
    }
}

#[derive(Debug, Deserialize)]
struct StravaActivity {
    id: Option<RawId>,
    athlete: Option<StravaAthlete>,
    name: Option<String>,
    description: Option<String>,
    sport_type: Option<String>,
    start_date: Option<String>,
    elapsed_time: Option<u64>,
    distance: Option<f64>,
    elev_high: Option<f64>,
    elev_low: Option<f64>,
    calories: Option<f64>,
    max_speed: Option<f64>,
    start_latlng: Option<Vec<f64>>, // [latitude, longitude]
    end_latlng: Option<Vec<f64>>,
    kudos_count: Option<u64>,
    comment_count: Option<u64>,
    private: Option<bool>,
    visibility: Option<String>,
    total_photo_count: Option<u64>,
    photos: Option<StravaPhotos>,
}

#[derive(Debug, Deserialize)]
struct StravaAthlete {
    id: Option<RawId>,
}

#[derive(Debug, Deserialize)]
struct StravaPhotos {
    primary: Option<StravaPrimaryPhoto>,
}

#[derive(Debug, Deserialize)]
struct StravaPrimaryPhoto {
    #[serde(default)]
    urls: BTreeMap<String, Option<String>>,
}

fn activity_list(raw: &Value) -> Result<&[Value]> {
    raw.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| Error::malformed(SERVICE_NAME, "expected a list of activities"))
}

fn parse_social_posting(raw: &Value) -> Option<SocialPosting> {
    from_object(raw).and_then(|activity| posting_from(&activity))
}

fn parse_physical_activity(raw: &Value) -> Option<PhysicalActivity> {
    let activity: StravaActivity = from_object(raw)?;
    let mut physical_activity = PhysicalActivity::new(posting_from(&activity)?);

    physical_activity.activity_type = activity.sport_type;
    physical_activity.distance = activity.distance;
    physical_activity.elevation_high = activity.elev_high;
    physical_activity.elevation_low = activity.elev_low;
    physical_activity.kilocalories = activity.calories;
    physical_activity.max_speed = activity.max_speed;
    physical_activity.set_timing(
        activity.start_date.as_deref().and_then(parse_utc_timestamp),
        activity.elapsed_time,
    );
    physical_activity.set_start_position(activity.start_latlng.as_deref());
    physical_activity.set_end_position(activity.end_latlng.as_deref());
    Some(physical_activity)
}

fn posting_from(activity: &StravaActivity) -> Option<SocialPosting> {
    // The athlete owns every activity listed for them
    let athlete_id = activity.athlete.as_ref()?.id.as_ref()?.to_string();

    let mut base = BaseVertical::new(Vertical::SocialPosting, SERVICE_NAME, &athlete_id);
    base.service_object_id = activity.id.as_ref().map(ToString::to_string);
    base.creator_user_id = Some(athlete_id);
    base.created_at = activity.start_date.as_deref().and_then(parse_utc_timestamp);
    base.url = base
        .service_object_id
        .as_ref()
        .and_then(|id| parse_http_url(&format!("{}/{}", ACTIVITY_URL, id)));

    let mut posting = SocialPosting::new(base);
    posting.associated_media = photos(activity);
    posting.interaction_count = Some(
        activity
            .kudos_count
            .unwrap_or(0)
            .saturating_add(activity.comment_count.unwrap_or(0)),
    );
    posting.status = Some(status(activity));
    posting.text = activity.description.clone();
    posting.title = activity.name.clone();
    Some(posting)
}

fn status(activity: &StravaActivity) -> PostStatus {
    if activity.private == Some(true) {
        PostStatus::Private
    } else if activity.visibility.as_deref() == Some("followers_only") {
        PostStatus::Restricted
    } else {
        PostStatus::Public
    }
}

fn photos(activity: &StravaActivity) -> Vec<AssociatedMedia> {
    if activity.total_photo_count.unwrap_or(0) == 0 {
        return Vec::new();
    }
    activity
        .photos
        .as_ref()
        .and_then(|photos| photos.primary.as_ref())
        .map(|primary| {
            primary
                .urls
                .values()
                .flatten()
                .filter_map(|url| AssociatedMedia::image(url))
                .collect()
        })
        .unwrap_or_default()
}
