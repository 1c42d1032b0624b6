use cloud_client::connector::Credentials;
use cloud_client::provider::{
    InstanceDescription, LaunchRequest, ManagementApi, ProviderError, ProviderResult, Resources,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory subscription. VMs are a map of name to provider state.
#[derive(Default)]
pub(crate) struct MockApi {
    pub(crate) vms: Mutex<BTreeMap<String, String>>,
    pub(crate) launched: Mutex<Vec<LaunchRequest>>,
    pub(crate) fail_create: AtomicBool,
    /// The create request is accepted but the answer never arrives.
    pub(crate) create_times_out: AtomicBool,
    pub(crate) fail_list: AtomicBool,
    pub(crate) fail_destroy: AtomicBool,
    /// Destroy answers that the VM does not exist.
    pub(crate) destroy_not_found: AtomicBool,
    pub(crate) destroy_calls: AtomicUsize,
}

impl MockApi {
    pub(crate) fn set_state(&self, name: &str, state: &str) {
        self.vms
            .lock()
            .unwrap()
            .insert(name.to_string(), state.to_string());
    }

    pub(crate) fn remove(&self, name: &str) {
        self.vms.lock().unwrap().remove(name);
    }

    pub(crate) fn vm_names(&self) -> Vec<String> {
        self.vms.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait::async_trait]
impl ManagementApi for MockApi {
    async fn list_instances(
        &self,
        _credentials: &Credentials,
    ) -> ProviderResult<Vec<InstanceDescription>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ProviderError::new(
                Resources::Clear,
                "management endpoint unavailable",
            ));
        }
        Ok(self
            .vms
            .lock()
            .unwrap()
            .iter()
            .map(|(name, state)| InstanceDescription {
                name: name.clone(),
                state: state.clone(),
            })
            .collect())
    }

    async fn create_instance(
        &self,
        _credentials: &Credentials,
        request: &LaunchRequest,
    ) -> ProviderResult<InstanceDescription> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ProviderError::new(
                Resources::Clear,
                "core quota exceeded",
            ));
        }
        self.launched.lock().unwrap().push(request.clone());
        self.set_state(&request.name, "Provisioning");
        if self.create_times_out.load(Ordering::SeqCst) {
            return Err(ProviderError::new(
                Resources::Unknown,
                format!("Creating instance '{}' timed out", request.name),
            ));
        }
        Ok(InstanceDescription {
            name: request.name.clone(),
            state: "Provisioning".to_string(),
        })
    }

    async fn destroy_instance(&self, _credentials: &Credentials, name: &str) -> ProviderResult<()> {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        if self.destroy_not_found.load(Ordering::SeqCst) {
            return Err(ProviderError::new(
                Resources::Clear,
                format!("VM '{}' not found", name),
            ));
        }
        if self.fail_destroy.load(Ordering::SeqCst) {
            return Err(ProviderError::new(
                Resources::Remaining,
                format!("VM '{}' is locked", name),
            ));
        }
        self.remove(name);
        Ok(())
    }
}
