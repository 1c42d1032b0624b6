/*!

The `client` module contains [`CloudClient`], which owns the image templates and the instances of
one cloud profile.

A client can be *degraded*: it was built without templates because the profile is broken, and it
carries the errors that explain why. A degraded client is still listed by the fleet manager so that
operators see those errors, but it never provisions anything.

!*/

use crate::connector::ApiConnector;
use crate::index::{ClientToken, InstanceIndex};
use crate::instance::CloudInstance;
use crate::provider::LaunchRequest;
use crate::store::InstanceStore;
use cloud_model::{
    AgentDescription, AgentId, ClientParameters, CloudImageTemplate, InstanceStatus, ProfileId,
    TypedCloudErrorInfo,
};
use log::{debug, info, trace, warn};
use snafu::{ensure, OptionExt, Snafu};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

pub type CloudClientResult<T> = std::result::Result<T, CloudClientError>;

/// Why a [`CloudClient`] refused an operation. Provider failures are not returned through this
/// type: they are recorded on the instance or the client.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CloudClientError {
    #[snafu(display("Profile '{}' is broken and cannot start instances", profile_id))]
    Degraded { profile_id: ProfileId },

    #[snafu(display("Client of profile '{}' has been disposed", profile_id))]
    Disposed { profile_id: ProfileId },

    #[snafu(display("Profile '{}' has no provider connection", profile_id))]
    NoConnector { profile_id: ProfileId },

    #[snafu(display("Profile '{}' has no image '{}'", profile_id, source_name))]
    UnknownImage {
        profile_id: ProfileId,
        source_name: String,
    },

    #[snafu(display("Profile '{}' has no instance '{}'", profile_id, name))]
    UnknownInstance { profile_id: ProfileId, name: String },

    #[snafu(display("Instance limit of {} reached for '{}'", limit, scope))]
    LimitReached { scope: String, limit: u32 },
}

/// The cloud client of one profile.
pub struct CloudClient {
    profile_id: ProfileId,
    parameters: ClientParameters,
    images: Vec<CloudImageTemplate>,
    connector: Option<ApiConnector>,
    max_instance_count: u32,
    /// Profile-level errors, replaced as a whole by `update_errors`.
    errors: RwLock<Vec<TypedCloudErrorInfo>>,
    /// The outcome of the last failed provider sync. Cleared by a successful one.
    provider_error: RwLock<Option<TypedCloudErrorInfo>>,
    instances: RwLock<BTreeMap<String, CloudInstance>>,
    store: InstanceStore,
    /// Serializes snapshot-and-save so an older snapshot never overwrites a newer one.
    persist_lock: Mutex<()>,
    index: Arc<InstanceIndex>,
    token: ClientToken,
    disposed: AtomicBool,
}

impl CloudClient {
    /// Create the client of `profile_id`. Instances saved by an earlier client of the same profile
    /// are adopted from `state_directory` and added to `index`.
    pub fn new(
        profile_id: &str,
        parameters: ClientParameters,
        images: Vec<CloudImageTemplate>,
        connector: Option<ApiConnector>,
        max_instance_count: u32,
        state_directory: &Path,
        index: Arc<InstanceIndex>,
    ) -> Self {
        let store = InstanceStore::new(state_directory, profile_id);
        let token = index.register_client();
        let records = store.load().unwrap_or_else(|e| {
            warn!(
                "Unable to load saved instances of profile '{}': {}",
                profile_id, e
            );
            Vec::new()
        });

        let mut instances = BTreeMap::new();
        for record in records {
            index.insert(&record.name, profile_id, token);
            let instance = CloudInstance::from_record(record, profile_id);
            instances.insert(instance.name().to_string(), instance);
        }
        if !instances.is_empty() {
            info!(
                "Profile '{}' adopted {} saved instance(s)",
                profile_id,
                instances.len()
            );
        }

        Self {
            profile_id: profile_id.to_string(),
            parameters,
            images,
            connector,
            max_instance_count,
            errors: RwLock::new(Vec::new()),
            provider_error: RwLock::new(None),
            instances: RwLock::new(instances),
            store,
            persist_lock: Mutex::new(()),
            index,
            token,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn parameters(&self) -> &ClientParameters {
        &self.parameters
    }

    pub fn images(&self) -> &[CloudImageTemplate] {
        &self.images
    }

    pub fn find_image(&self, source_name: &str) -> Option<&CloudImageTemplate> {
        self.images.iter().find(|i| i.source_name() == source_name)
    }

    pub fn max_instance_count(&self) -> u32 {
        self.max_instance_count
    }

    pub fn has_connector(&self) -> bool {
        self.connector.is_some()
    }

    /// A snapshot of the tracked instances, ordered by name.
    pub fn instances(&self) -> Vec<CloudInstance> {
        self.read_instances().values().cloned().collect()
    }

    pub fn find_instance(&self, name: &str) -> Option<CloudInstance> {
        self.read_instances().get(name).cloned()
    }

    /// The profile errors followed by the error of the last provider sync, if it failed.
    pub fn errors(&self) -> Vec<TypedCloudErrorInfo> {
        let mut errors = self
            .errors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(e) = self
            .provider_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            errors.push(e.clone());
        }
        errors
    }

    /// Replace the profile errors. Errors from earlier calls are not kept.
    pub fn update_errors<I>(&self, errors: I)
    where
        I: IntoIterator<Item = TypedCloudErrorInfo>,
    {
        let errors: Vec<_> = errors.into_iter().collect();
        debug!(
            "Profile '{}' now has {} error(s)",
            self.profile_id,
            errors.len()
        );
        *self.errors.write().unwrap_or_else(PoisonError::into_inner) = errors;
    }

    /// True if the client has no templates because its profile is broken.
    pub fn is_degraded(&self) -> bool {
        self.images.is_empty()
            && !self
                .errors
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Whether `start_new_instance(source_name)` would request a VM right now.
    pub fn can_start_new_instance(&self, source_name: &str) -> bool {
        let instances = self.read_instances();
        self.check_can_start(&instances, source_name).is_ok()
    }

    /// Request a new VM from the template `source_name`.
    ///
    /// The instance is tracked as `Scheduled` before the provider is called. If the provider call
    /// fails, the failure is recorded on the instance, which stays visible in the `Error` state.
    /// Unless the provider reports that nothing was left behind, the instance is destroyed through
    /// the provider when it is terminated.
    pub async fn start_new_instance(&self, source_name: &str) -> CloudClientResult<CloudInstance> {
        let (request, connector) = {
            let mut instances = self.write_instances();
            let template = self.check_can_start(&instances, source_name)?;
            let connector = self.connector.clone().context(NoConnectorSnafu {
                profile_id: &self.profile_id,
            })?;
            let name = unique_name(template.vm_name_prefix(), &instances);
            let instance = CloudInstance::scheduled(&name, source_name, &self.profile_id);
            instances.insert(name.clone(), instance);
            self.index.insert(&name, &self.profile_id, self.token);
            (LaunchRequest::from_template(name, template), connector)
        };
        self.persist();
        info!(
            "Profile '{}' requests instance '{}' from image '{}'",
            self.profile_id, request.name, source_name
        );

        let outcome = connector.create_instance(&request).await;
        let snapshot = {
            let mut instances = self.write_instances();
            let instance = instances.get_mut(&request.name).context(UnknownInstanceSnafu {
                profile_id: &self.profile_id,
                name: &request.name,
            })?;
            match outcome {
                Ok(description) => {
                    let status = match InstanceStatus::from_provider_state(&description.state) {
                        InstanceStatus::Unknown => InstanceStatus::Starting,
                        status => status,
                    };
                    instance.confirm(status);
                }
                Err(e) => {
                    warn!("Unable to start instance '{}': {}", request.name, e);
                    instance.fail_create(
                        TypedCloudErrorInfo::instance(format!(
                            "Unable to start instance '{}'",
                            request.name
                        ))
                        .with_details(e.to_string()),
                        e.resources().may_remain(),
                    );
                }
            }
            instance.clone()
        };
        self.persist();
        Ok(snapshot)
    }

    /// Destroy the VM `name` and stop tracking it. An instance that never reached the provider is
    /// only dropped locally. A failed destroy that may leave the VM behind is recorded on the
    /// instance, which stays tracked.
    pub async fn terminate_instance(&self, name: &str) -> CloudClientResult<()> {
        let connector = {
            let mut instances = self.write_instances();
            let instance = instances.get_mut(name).context(UnknownInstanceSnafu {
                profile_id: &self.profile_id,
                name,
            })?;
            if instance.is_confirmed() {
                let connector = self.connector.clone().context(NoConnectorSnafu {
                    profile_id: &self.profile_id,
                })?;
                instance.set_status(InstanceStatus::Stopping);
                Some(connector)
            } else {
                instances.remove(name);
                self.index.remove(name, self.token);
                None
            }
        };
        self.persist();
        let connector = match connector {
            Some(some) => some,
            None => {
                debug!("Dropped unconfirmed instance '{}'", name);
                return Ok(());
            }
        };

        info!("Profile '{}' terminates instance '{}'", self.profile_id, name);
        let outcome = connector.destroy_instance(name).await;
        {
            let mut instances = self.write_instances();
            match outcome {
                Ok(()) => {
                    instances.remove(name);
                    self.index.remove(name, self.token);
                }
                Err(e) if !e.resources().may_remain() => {
                    info!("Instance '{}' is already gone: {}", name, e);
                    instances.remove(name);
                    self.index.remove(name, self.token);
                }
                Err(e) => {
                    warn!("Unable to terminate instance '{}': {}", name, e);
                    if let Some(instance) = instances.get_mut(name) {
                        instance.fail(
                            TypedCloudErrorInfo::instance(format!(
                                "Unable to terminate instance '{}'",
                                name
                            ))
                            .with_details(e.to_string()),
                        );
                    }
                }
            }
        }
        self.persist();
        Ok(())
    }

    /// Refresh instance states from the provider. Confirmed instances that the provider no longer
    /// reports are dropped. A listing failure is kept as a `Provider` error until the next
    /// successful sync.
    pub async fn sync_with_provider(&self) {
        let connector = match &self.connector {
            Some(some) => some,
            None => {
                trace!("Profile '{}' has no connector to sync", self.profile_id);
                return;
            }
        };
        let listed = match connector.list_instances().await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(
                    "Unable to list instances of profile '{}': {}",
                    self.profile_id, e
                );
                *self
                    .provider_error
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(
                    TypedCloudErrorInfo::provider("Unable to list instances")
                        .with_details(e.to_string()),
                );
                return;
            }
        };
        *self
            .provider_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;

        let states: BTreeMap<&str, &str> = listed
            .iter()
            .map(|d| (d.name.as_str(), d.state.as_str()))
            .collect();
        {
            let mut instances = self.write_instances();
            let mut gone = Vec::new();
            for (name, instance) in instances.iter_mut() {
                match states.get(name.as_str()) {
                    Some(state) => {
                        let status = InstanceStatus::from_provider_state(state);
                        if status != instance.status() {
                            debug!(
                                "Instance '{}' is now {} (provider state '{}')",
                                name, status, state
                            );
                        }
                        instance.confirm(status);
                    }
                    None if instance.is_confirmed() => gone.push(name.clone()),
                    None => {}
                }
            }
            for name in gone {
                info!(
                    "Instance '{}' of profile '{}' no longer exists",
                    name, self.profile_id
                );
                instances.remove(&name);
                self.index.remove(&name, self.token);
            }
        }
        self.persist();
    }

    /// The instance that `agent` reports it runs on, if this client tracks it.
    pub fn find_instance_by_agent(&self, agent: &AgentDescription) -> Option<CloudInstance> {
        let name = agent.instance_name()?;
        self.read_instances()
            .get(name)
            .filter(|instance| instance.contains_agent(agent))
            .cloned()
    }

    /// Record that `agent_id` runs on instance `name`.
    pub fn link_agent(&self, name: &str, agent_id: AgentId) -> CloudClientResult<()> {
        let mut instances = self.write_instances();
        let instance = instances.get_mut(name).context(UnknownInstanceSnafu {
            profile_id: &self.profile_id,
            name,
        })?;
        instance.link_agent(agent_id);
        debug!("Linked agent {} to instance '{}'", agent_id, name);
        Ok(())
    }

    /// Stop using this client. Its index entries are removed; the saved instance file is left for
    /// the next client of the profile.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.index.remove_client(self.token);
            debug!("Disposed client of profile '{}'", self.profile_id);
        }
    }

    fn check_can_start<'a>(
        &'a self,
        instances: &BTreeMap<String, CloudInstance>,
        source_name: &str,
    ) -> CloudClientResult<&'a CloudImageTemplate> {
        ensure!(
            !self.is_disposed(),
            DisposedSnafu {
                profile_id: &self.profile_id
            }
        );
        ensure!(
            !self.is_degraded(),
            DegradedSnafu {
                profile_id: &self.profile_id
            }
        );
        let template = self.find_image(source_name).context(UnknownImageSnafu {
            profile_id: &self.profile_id,
            source_name,
        })?;
        ensure!(
            self.connector.is_some(),
            NoConnectorSnafu {
                profile_id: &self.profile_id
            }
        );

        let live = instances.values().filter(|i| i.status().is_live());
        let live_count = live.clone().count();
        ensure!(
            (live_count as u64) < u64::from(self.max_instance_count),
            LimitReachedSnafu {
                scope: format!("profile '{}'", self.profile_id),
                limit: self.max_instance_count,
            }
        );
        if let Some(limit) = template.max_instances() {
            let image_count = live.filter(|i| i.source_name() == source_name).count();
            ensure!(
                (image_count as u64) < u64::from(limit),
                LimitReachedSnafu {
                    scope: format!("image '{}'", source_name),
                    limit,
                }
            );
        }
        Ok(template)
    }

    fn persist(&self) {
        let _guard = self
            .persist_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_disposed() {
            return;
        }
        let records: Vec<_> = self
            .read_instances()
            .values()
            .map(CloudInstance::record)
            .collect();
        if let Err(e) = self.store.save(&records) {
            warn!(
                "Unable to save instances of profile '{}': {}",
                self.profile_id, e
            );
        }
    }

    fn read_instances(&self) -> RwLockReadGuard<'_, BTreeMap<String, CloudInstance>> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_instances(&self) -> RwLockWriteGuard<'_, BTreeMap<String, CloudInstance>> {
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClient")
            .field("profile_id", &self.profile_id)
            .field("parameters", &self.parameters)
            .field("images", &self.images.len())
            .field("connector", &self.connector)
            .field("max_instance_count", &self.max_instance_count)
            .field("instances", &self.read_instances().len())
            .finish()
    }
}

/// `<prefix>-<8 hex chars>`, retried until it does not clash with a tracked instance.
fn unique_name(prefix: &str, instances: &BTreeMap<String, CloudInstance>) -> String {
    let taken: HashSet<&str> = instances.keys().map(String::as_str).collect();
    loop {
        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!("{}-{}", prefix, suffix.get(..8).unwrap_or(suffix.as_str()));
        if !taken.contains(name.as_str()) {
            return name;
        }
    }
}
