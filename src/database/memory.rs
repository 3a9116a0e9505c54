use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::*;
use super::store::{constraints, DisplayNumberOwner, NewRegistration, Store};

#[derive(Default)]
struct Tables {
    identities: HashMap<Uuid, AuthIdentity>,
    users: HashMap<Uuid, UserInfo>,
    plans: BTreeMap<String, Plan>,
    invoices: HashMap<Uuid, InvoiceData>,
    participants: HashMap<Uuid, ParticipantDetails>,
    hours: HashMap<Uuid, Vec<OpeningHours>>,
    map_infos: HashMap<Uuid, MapInfo>,
    hubs: HashMap<Uuid, Hub>,
    hub_participants: Vec<HubParticipant>,
    events: HashMap<Uuid, Event>,
    routes: HashMap<Uuid, Route>,
    route_dots: Vec<RouteDot>,
    sections: HashMap<String, ContentSection>,
    items: HashMap<String, Vec<ContentItem>>,
}

impl Tables {
    fn owners_of(&self, display_number: &str) -> Vec<DisplayNumberOwner> {
        let participants = self
            .participants
            .values()
            .filter(|p| p.display_number.as_deref() == Some(display_number))
            .map(|p| DisplayNumberOwner::Participant(p.user_id));
        let hubs = self
            .hubs
            .values()
            .filter(|h| h.display_number.as_deref() == Some(display_number))
            .map(|h| DisplayNumberOwner::Hub(h.id));
        participants.chain(hubs).collect()
    }

    fn check_display_number(&self, display_number: Option<&str>, claimant: DisplayNumberOwner) -> Result<(), DatabaseError> {
        if let Some(value) = display_number {
            if self.owners_of(value).iter().any(|owner| *owner != claimant) {
                return Err(DatabaseError::conflict(constraints::DISPLAY_NUMBER));
            }
        }
        Ok(())
    }

    fn require_user(&self, id: Uuid, fk: &str) -> Result<(), DatabaseError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(DatabaseError::ForeignKey(fk.to_string()))
        }
    }

    fn check_participant(&self, details: &ParticipantDetails) -> Result<(), DatabaseError> {
        let slug_taken = self
            .participants
            .values()
            .any(|p| p.slug == details.slug && p.user_id != details.user_id);
        if slug_taken {
            return Err(DatabaseError::conflict(constraints::PARTICIPANT_SLUG));
        }
        self.check_display_number(
            details.display_number.as_deref(),
            DisplayNumberOwner::Participant(details.user_id),
        )
    }

    fn check_map_info(&self, map_info: &MapInfo) -> Result<(), DatabaseError> {
        if let Some(user_id) = map_info.user_id {
            self.require_user(user_id, "map_info_user_id_fkey")?;
            let taken = self
                .map_infos
                .values()
                .any(|m| m.user_id == Some(user_id) && m.id != map_info.id);
            if taken {
                return Err(DatabaseError::conflict(constraints::MAP_INFO_USER));
            }
        }
        Ok(())
    }

    fn check_hub(&self, hub: &Hub, participants: &[Uuid]) -> Result<(), DatabaseError> {
        self.require_user(hub.hub_host, "hubs_hub_host_fkey")?;
        for user_id in participants {
            self.require_user(*user_id, "hub_participants_user_id_fkey")?;
        }
        self.check_display_number(hub.display_number.as_deref(), DisplayNumberOwner::Hub(hub.id))
    }

    fn check_route_dots(&self, dots: &[RouteDot]) -> Result<(), DatabaseError> {
        let mut steps: Vec<i32> = Vec::with_capacity(dots.len());
        for dot in dots {
            if !self.map_infos.contains_key(&dot.map_info_id) {
                return Err(DatabaseError::ForeignKey("route_dots_map_info_id_fkey".to_string()));
            }
            if steps.contains(&dot.step) {
                return Err(DatabaseError::conflict("route_dots_pkey"));
            }
            steps.push(dot.step);
        }
        Ok(())
    }

    fn set_hub_participants(&mut self, hub_id: Uuid, participants: &[Uuid]) {
        self.hub_participants.retain(|hp| hp.hub_id != hub_id);
        for user_id in participants {
            let row = HubParticipant { hub_id, user_id: *user_id };
            if !self.hub_participants.contains(&row) {
                self.hub_participants.push(row);
            }
        }
    }

    fn set_route_dots(&mut self, route_id: Uuid, dots: &[RouteDot]) {
        self.route_dots.retain(|d| d.route_id != route_id);
        self.route_dots.extend(dots.iter().map(|d| RouteDot {
            route_id,
            ..d.clone()
        }));
    }
}

fn not_found(what: &str) -> DatabaseError {
    DatabaseError::NotFound(format!("{} not found", what))
}

/// Process-local store with the same constraints as the Postgres schema.
///
/// Every write validates first and mutates afterwards under one lock, so a
/// rejected write leaves no partial state behind.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<AuthIdentity>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.identities
            .values()
            .find(|i| i.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_registration(&self, r: &NewRegistration) -> Result<(), DatabaseError> {
        let mut t = self.tables.write().await;

        if t.identities.values().any(|i| i.email == r.identity.email) {
            return Err(DatabaseError::conflict(constraints::IDENTITY_EMAIL));
        }
        if t.identities.contains_key(&r.identity.id) {
            return Err(DatabaseError::conflict("auth_identities_pkey"));
        }
        if let Some(plan_id) = &r.user.plan_id {
            if !t.plans.contains_key(plan_id) {
                return Err(DatabaseError::ForeignKey("user_info_plan_id_fkey".to_string()));
            }
        }
        if let Some(details) = &r.participant {
            t.check_participant(details)?;
        }
        if let Some(map_info) = &r.map_info {
            if t.map_infos.contains_key(&map_info.id) {
                return Err(DatabaseError::conflict("map_info_pkey"));
            }
        }

        t.identities.insert(r.identity.id, r.identity.clone());
        t.users.insert(r.user.id, r.user.clone());
        if let Some(invoice) = &r.invoice {
            t.invoices.insert(invoice.user_id, invoice.clone());
        }
        if let Some(details) = &r.participant {
            t.participants.insert(details.user_id, details.clone());
        }
        if let Some(map_info) = &r.map_info {
            t.map_infos.insert(map_info.id, map_info.clone());
        }
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<UserInfo>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self, plan_type: Option<PlanType>) -> Result<Vec<UserInfo>, DatabaseError> {
        let t = self.tables.read().await;
        let mut users: Vec<UserInfo> = t
            .users
            .values()
            .filter(|u| plan_type.map_or(true, |p| u.plan_type == p))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserInfo>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| t.users.get(id).cloned()).collect())
    }

    async fn update_user(&self, user: &UserInfo) -> Result<UserInfo, DatabaseError> {
        let mut t = self.tables.write().await;
        if let Some(plan_id) = &user.plan_id {
            if !t.plans.contains_key(plan_id) {
                return Err(DatabaseError::ForeignKey("user_info_plan_id_fkey".to_string()));
            }
        }
        let row = t.users.get_mut(&user.id).ok_or_else(|| not_found("User"))?;
        row.name = user.name.clone();
        row.plan_id = user.plan_id.clone();
        row.plan_type = user.plan_type;
        row.role = user.role;
        Ok(row.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<Vec<String>, DatabaseError> {
        let mut t = self.tables.write().await;
        if !t.identities.contains_key(&id) {
            return Err(not_found("User"));
        }
        if t.hubs.values().any(|h| h.hub_host == id) {
            return Err(DatabaseError::ForeignKey("hubs_hub_host_fkey".to_string()));
        }
        let own_points: Vec<Uuid> = t
            .map_infos
            .values()
            .filter(|m| m.user_id == Some(id))
            .map(|m| m.id)
            .collect();
        if t.route_dots.iter().any(|d| own_points.contains(&d.map_info_id)) {
            return Err(DatabaseError::ForeignKey("route_dots_map_info_id_fkey".to_string()));
        }

        let mut files: Vec<String> = Vec::new();
        if let Some(path) = t.participants.get(&id).and_then(|p| p.image_path.clone()) {
            files.push(path);
        }
        files.extend(
            t.events
                .values()
                .filter(|e| e.organizer_id == id)
                .filter_map(|e| e.image_path.clone()),
        );

        t.identities.remove(&id);
        t.users.remove(&id);
        t.invoices.remove(&id);
        t.participants.remove(&id);
        t.hours.remove(&id);
        t.map_infos.retain(|_, m| m.user_id != Some(id));
        t.hub_participants.retain(|hp| hp.user_id != id);
        t.events.retain(|_, e| e.organizer_id != id);
        for event in t.events.values_mut() {
            event.co_organizers.retain(|c| *c != id);
        }

        files.sort();
        files.dedup();
        Ok(files)
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, DatabaseError> {
        let mut plans: Vec<Plan> = self.tables.read().await.plans.values().cloned().collect();
        plans.sort_by(Plan::list_order);
        Ok(plans)
    }

    async fn get_plan(&self, plan_id: &str) -> Result<Option<Plan>, DatabaseError> {
        Ok(self.tables.read().await.plans.get(plan_id).cloned())
    }

    async fn insert_plan(&self, plan: &Plan) -> Result<Plan, DatabaseError> {
        let mut t = self.tables.write().await;
        if t.plans.contains_key(&plan.plan_id) {
            return Err(DatabaseError::conflict(constraints::PLAN_ID));
        }
        t.plans.insert(plan.plan_id.clone(), plan.clone());
        Ok(plan.clone())
    }

    async fn update_plan(&self, plan: &Plan) -> Result<Plan, DatabaseError> {
        let mut t = self.tables.write().await;
        let row = t.plans.get_mut(&plan.plan_id).ok_or_else(|| not_found("Plan"))?;
        *row = plan.clone();
        Ok(plan.clone())
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<(), DatabaseError> {
        let mut t = self.tables.write().await;
        t.plans.remove(plan_id).ok_or_else(|| not_found("Plan"))?;
        for user in t.users.values_mut() {
            if user.plan_id.as_deref() == Some(plan_id) {
                user.plan_id = None;
            }
        }
        Ok(())
    }

    async fn get_invoice(&self, user_id: Uuid) -> Result<Option<InvoiceData>, DatabaseError> {
        Ok(self.tables.read().await.invoices.get(&user_id).cloned())
    }

    async fn upsert_invoice(&self, invoice: &InvoiceData) -> Result<InvoiceData, DatabaseError> {
        let mut t = self.tables.write().await;
        t.require_user(invoice.user_id, "invoice_data_user_id_fkey")?;
        t.invoices.insert(invoice.user_id, invoice.clone());
        Ok(invoice.clone())
    }

    async fn get_participant(&self, user_id: Uuid) -> Result<Option<ParticipantDetails>, DatabaseError> {
        Ok(self.tables.read().await.participants.get(&user_id).cloned())
    }

    async fn find_participant_by_slug(&self, slug: &str) -> Result<Option<ParticipantDetails>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.participants.values().find(|p| p.slug == slug).cloned())
    }

    async fn list_participants(&self) -> Result<Vec<ParticipantDetails>, DatabaseError> {
        let t = self.tables.read().await;
        let mut rows: Vec<ParticipantDetails> = t.participants.values().cloned().collect();
        rows.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| a.slug.cmp(&b.slug)));
        Ok(rows)
    }

    async fn insert_participant(&self, details: &ParticipantDetails) -> Result<ParticipantDetails, DatabaseError> {
        let mut t = self.tables.write().await;
        t.require_user(details.user_id, "participant_details_user_id_fkey")?;
        if t.participants.contains_key(&details.user_id) {
            return Err(DatabaseError::conflict("participant_details_pkey"));
        }
        t.check_participant(details)?;
        t.participants.insert(details.user_id, details.clone());
        Ok(details.clone())
    }

    async fn update_participant(&self, details: &ParticipantDetails) -> Result<ParticipantDetails, DatabaseError> {
        let mut t = self.tables.write().await;
        if !t.participants.contains_key(&details.user_id) {
            return Err(not_found("Participant"));
        }
        t.check_participant(details)?;
        t.participants.insert(details.user_id, details.clone());
        Ok(details.clone())
    }

    async fn get_hours(&self, user_id: Uuid) -> Result<Vec<OpeningHours>, DatabaseError> {
        let t = self.tables.read().await;
        let mut hours = t.hours.get(&user_id).cloned().unwrap_or_default();
        hours.sort_by_key(|h| h.position);
        Ok(hours)
    }

    async fn replace_hours(&self, user_id: Uuid, hours: &[OpeningHours]) -> Result<Vec<OpeningHours>, DatabaseError> {
        let mut t = self.tables.write().await;
        t.require_user(user_id, "opening_hours_user_id_fkey")?;
        let mut rows: Vec<OpeningHours> = hours
            .iter()
            .map(|h| OpeningHours {
                user_id,
                ..h.clone()
            })
            .collect();
        rows.sort_by_key(|h| h.position);
        if rows.windows(2).any(|w| w[0].position == w[1].position) {
            return Err(DatabaseError::conflict("opening_hours_pkey"));
        }
        t.hours.insert(user_id, rows.clone());
        Ok(rows)
    }

    async fn display_number_owners(&self, display_number: &str) -> Result<Vec<DisplayNumberOwner>, DatabaseError> {
        Ok(self.tables.read().await.owners_of(display_number))
    }

    async fn get_map_info_for_user(&self, user_id: Uuid) -> Result<Option<MapInfo>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.map_infos.values().find(|m| m.user_id == Some(user_id)).cloned())
    }

    async fn list_map_infos(&self) -> Result<Vec<MapInfo>, DatabaseError> {
        Ok(self.tables.read().await.map_infos.values().cloned().collect())
    }

    async fn map_infos_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MapInfo>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| t.map_infos.get(id).cloned()).collect())
    }

    async fn upsert_map_info(&self, map_info: &MapInfo) -> Result<MapInfo, DatabaseError> {
        let mut t = self.tables.write().await;
        t.check_map_info(map_info)?;
        t.map_infos.insert(map_info.id, map_info.clone());
        Ok(map_info.clone())
    }

    async fn list_hubs(&self) -> Result<Vec<Hub>, DatabaseError> {
        let t = self.tables.read().await;
        let mut hubs: Vec<Hub> = t.hubs.values().cloned().collect();
        hubs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hubs)
    }

    async fn get_hub(&self, id: Uuid) -> Result<Option<Hub>, DatabaseError> {
        Ok(self.tables.read().await.hubs.get(&id).cloned())
    }

    async fn hub_participants(&self, hub_ids: &[Uuid]) -> Result<Vec<HubParticipant>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.hub_participants
            .iter()
            .filter(|hp| hub_ids.contains(&hp.hub_id))
            .cloned()
            .collect())
    }

    async fn insert_hub(&self, hub: &Hub, participants: &[Uuid]) -> Result<Hub, DatabaseError> {
        let mut t = self.tables.write().await;
        if t.hubs.contains_key(&hub.id) {
            return Err(DatabaseError::conflict("hubs_pkey"));
        }
        t.check_hub(hub, participants)?;
        t.hubs.insert(hub.id, hub.clone());
        t.set_hub_participants(hub.id, participants);
        Ok(hub.clone())
    }

    async fn update_hub(&self, hub: &Hub, participants: &[Uuid]) -> Result<Hub, DatabaseError> {
        let mut t = self.tables.write().await;
        let created_at = t.hubs.get(&hub.id).map(|h| h.created_at).ok_or_else(|| not_found("Hub"))?;
        t.check_hub(hub, participants)?;
        let row = Hub {
            created_at,
            ..hub.clone()
        };
        t.hubs.insert(hub.id, row.clone());
        t.set_hub_participants(hub.id, participants);
        Ok(row)
    }

    async fn delete_hub(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut t = self.tables.write().await;
        t.hubs.remove(&id).ok_or_else(|| not_found("Hub"))?;
        t.hub_participants.retain(|hp| hp.hub_id != id);
        Ok(())
    }

    async fn list_events(&self, organizer: Option<Uuid>) -> Result<Vec<Event>, DatabaseError> {
        let t = self.tables.read().await;
        let mut events: Vec<Event> = t
            .events
            .values()
            .filter(|e| organizer.map_or(true, |id| e.is_organized_by(id)))
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            a.day
                .cmp(&b.day)
                .then_with(|| match (&a.start_time, &b.start_time) {
                    (Some(x), Some(y)) => x.cmp(y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(events)
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, DatabaseError> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn insert_event(&self, event: &Event) -> Result<Event, DatabaseError> {
        let mut t = self.tables.write().await;
        t.require_user(event.organizer_id, "events_organizer_id_fkey")?;
        if t.events.contains_key(&event.id) {
            return Err(DatabaseError::conflict("events_pkey"));
        }
        t.events.insert(event.id, event.clone());
        Ok(event.clone())
    }

    async fn update_event(&self, event: &Event) -> Result<Event, DatabaseError> {
        let mut t = self.tables.write().await;
        let created_at = t.events.get(&event.id).map(|e| e.created_at).ok_or_else(|| not_found("Event"))?;
        t.require_user(event.organizer_id, "events_organizer_id_fkey")?;
        let row = Event {
            created_at,
            ..event.clone()
        };
        t.events.insert(event.id, row.clone());
        Ok(row)
    }

    async fn delete_event(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut t = self.tables.write().await;
        t.events.remove(&id).map(|_| ()).ok_or_else(|| not_found("Event"))
    }

    async fn list_routes(&self) -> Result<Vec<Route>, DatabaseError> {
        let t = self.tables.read().await;
        let mut routes: Vec<Route> = t.routes.values().cloned().collect();
        routes.sort_by(|a, b| a.zone.as_str().cmp(b.zone.as_str()).then_with(|| a.name.cmp(&b.name)));
        Ok(routes)
    }

    async fn get_route(&self, id: Uuid) -> Result<Option<Route>, DatabaseError> {
        Ok(self.tables.read().await.routes.get(&id).cloned())
    }

    async fn route_dots(&self, route_ids: &[Uuid]) -> Result<Vec<RouteDot>, DatabaseError> {
        let t = self.tables.read().await;
        let mut dots: Vec<RouteDot> = t
            .route_dots
            .iter()
            .filter(|d| route_ids.contains(&d.route_id))
            .cloned()
            .collect();
        dots.sort_by(|a, b| a.route_id.cmp(&b.route_id).then_with(|| a.step.cmp(&b.step)));
        Ok(dots)
    }

    async fn insert_route(&self, route: &Route, dots: &[RouteDot]) -> Result<Route, DatabaseError> {
        let mut t = self.tables.write().await;
        if t.routes.contains_key(&route.id) {
            return Err(DatabaseError::conflict("routes_pkey"));
        }
        t.check_route_dots(dots)?;
        t.routes.insert(route.id, route.clone());
        t.set_route_dots(route.id, dots);
        Ok(route.clone())
    }

    async fn update_route(&self, route: &Route, dots: &[RouteDot]) -> Result<Route, DatabaseError> {
        let mut t = self.tables.write().await;
        let created_at = t.routes.get(&route.id).map(|r| r.created_at).ok_or_else(|| not_found("Route"))?;
        t.check_route_dots(dots)?;
        let row = Route {
            created_at,
            ..route.clone()
        };
        t.routes.insert(route.id, row.clone());
        t.set_route_dots(route.id, dots);
        Ok(row)
    }

    async fn delete_route(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut t = self.tables.write().await;
        t.routes.remove(&id).ok_or_else(|| not_found("Route"))?;
        t.route_dots.retain(|d| d.route_id != id);
        Ok(())
    }

    async fn get_section(&self, section: &str) -> Result<Option<ContentSection>, DatabaseError> {
        Ok(self.tables.read().await.sections.get(section).cloned())
    }

    async fn list_items(&self, section: &str) -> Result<Vec<ContentItem>, DatabaseError> {
        let t = self.tables.read().await;
        let mut items = t.items.get(section).cloned().unwrap_or_default();
        items.sort_by_key(|i| i.position);
        Ok(items)
    }

    async fn save_section(
        &self,
        section: &ContentSection,
        items: Option<&[ContentItem]>,
    ) -> Result<(ContentSection, Vec<ContentItem>), DatabaseError> {
        let mut t = self.tables.write().await;
        let name = section.section.as_str();

        if let Some(items) = items {
            let foreign_id = items.iter().any(|item| {
                t.items
                    .iter()
                    .any(|(other, rows)| other != name && rows.iter().any(|r| r.id == item.id))
            });
            if foreign_id {
                return Err(DatabaseError::conflict("content_items_pkey"));
            }
            let rows: Vec<ContentItem> = items
                .iter()
                .map(|item| ContentItem {
                    section: name.to_string(),
                    ..item.clone()
                })
                .collect();
            t.items.insert(name.to_string(), rows);
        }
        t.sections.insert(name.to_string(), section.clone());

        let mut rows = t.items.get(name).cloned().unwrap_or_default();
        rows.sort_by_key(|i| i.position);
        Ok((section.clone(), rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn registration(email: &str, slug: Option<&str>, display_number: Option<&str>) -> NewRegistration {
        let id = Uuid::new_v4();
        let now = Utc::now();
        NewRegistration {
            identity: AuthIdentity {
                id,
                email: email.to_string(),
                password_hash: "hash".to_string(),
                salt: "salt".to_string(),
                created_at: now,
            },
            user: UserInfo {
                id,
                email: email.to_string(),
                name: "Test".to_string(),
                plan_id: None,
                plan_type: if slug.is_some() { PlanType::Participant } else { PlanType::Free },
                role: UserRole::User,
                created_at: now,
            },
            invoice: None,
            participant: slug.map(|s| ParticipantDetails {
                user_id: id,
                slug: s.to_string(),
                short_description: "short".to_string(),
                long_description: None,
                is_sticky: false,
                status: ParticipantStatus::Pending,
                year: 2024,
                display_number: display_number.map(str::to_string),
                image_path: None,
            }),
            map_info: None,
        }
    }

    #[tokio::test]
    async fn duplicate_slug_rejects_whole_registration() {
        let store = MemoryStore::new();
        store.insert_registration(&registration("a@x.io", Some("studio"), None)).await.unwrap();

        let second = registration("b@x.io", Some("studio"), None);
        let err = store.insert_registration(&second).await.unwrap_err();
        assert!(err.is_conflict_on(constraints::PARTICIPANT_SLUG));
        assert!(store.find_identity_by_email("b@x.io").await.unwrap().is_none());
        assert!(store.get_user(second.user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn hub_with_unknown_participant_is_not_created() {
        let store = MemoryStore::new();
        let host = registration("host@x.io", None, None);
        store.insert_registration(&host).await.unwrap();

        let hub = Hub {
            id: Uuid::new_v4(),
            name: "North hub".to_string(),
            description: None,
            hub_host: host.user.id,
            display_number: None,
            created_at: Utc::now(),
        };
        let err = store.insert_hub(&hub, &[host.user.id, Uuid::new_v4()]).await.unwrap_err();
        assert!(matches!(err, DatabaseError::ForeignKey(_)));
        assert!(store.get_hub(hub.id).await.unwrap().is_none());
        assert!(store.hub_participants(&[hub.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn display_numbers_are_shared_between_participants_and_hubs() {
        let store = MemoryStore::new();
        let p = registration("p@x.io", Some("p"), Some("A1"));
        store.insert_registration(&p).await.unwrap();

        let owners = store.display_number_owners("A1").await.unwrap();
        assert_eq!(owners, vec![DisplayNumberOwner::Participant(p.user.id)]);

        let hub = Hub {
            id: Uuid::new_v4(),
            name: "Hub".to_string(),
            description: None,
            hub_host: p.user.id,
            display_number: Some("A1".to_string()),
            created_at: Utc::now(),
        };
        let err = store.insert_hub(&hub, &[]).await.unwrap_err();
        assert!(err.is_conflict_on(constraints::DISPLAY_NUMBER));

        // Re-saving the owner's own number is not a conflict
        let details = store.get_participant(p.user.id).await.unwrap().unwrap();
        store.update_participant(&details).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_a_hub_host_is_restricted() {
        let store = MemoryStore::new();
        let host = registration("host@x.io", None, None);
        store.insert_registration(&host).await.unwrap();
        let hub = Hub {
            id: Uuid::new_v4(),
            name: "Hub".to_string(),
            description: None,
            hub_host: host.user.id,
            display_number: None,
            created_at: Utc::now(),
        };
        store.insert_hub(&hub, &[]).await.unwrap();

        assert!(matches!(store.delete_user(host.user.id).await, Err(DatabaseError::ForeignKey(_))));
        store.delete_hub(hub.id).await.unwrap();
        store.delete_user(host.user.id).await.unwrap();
        assert!(matches!(store.delete_user(host.user.id).await, Err(DatabaseError::NotFound(_))));
    }
}
