use serde::Deserialize;

use crate::{
    Result, client::Duffel, iter::ListIter, newtypes::LoyaltyProgrammeId, request::EmptyPayload,
};

#[derive(Clone, Debug, Deserialize)]
pub struct LoyaltyProgramme {
    pub id: LoyaltyProgrammeId,
    pub name: String,
    #[serde(default)]
    pub alliance: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub owner_airline_id: Option<String>,
}

impl Duffel {
    pub async fn get_loyalty_programme(&self, id: &LoyaltyProgrammeId) -> Result<LoyaltyProgramme> {
        self.request::<EmptyPayload, LoyaltyProgramme>()
            .get(format!("/air/loyalty_programmes/{id}"))
            .single()
            .await
    }

    pub fn list_loyalty_programmes(&self) -> ListIter<'_, LoyaltyProgramme> {
        self.request::<EmptyPayload, LoyaltyProgramme>()
            .get("/air/loyalty_programmes")
            .iter()
    }
}
