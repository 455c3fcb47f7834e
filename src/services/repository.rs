use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use crate::errors::{StoreError, StoreResult};
use crate::models::{Clase, Inscripcion, SolicitudMaterial, TiempoClase, Usuario};
use super::store::DocumentStore;

const USUARIOS: &str = "usuarios";
const CLASES: &str = "clases";
const INSCRIPCIONES: &str = "inscripciones";
const TIEMPO_CLASE: &str = "tiempoClase";
const SOLICITUDES: &str = "solicitudMaterial";

// Attempts of an optimistic update before giving up. Every lost attempt
// means another writer succeeded, so this bounds contention, not progress.
const MAX_UPDATE_ATTEMPTS: usize = 128;

/// Typed access to every collection of the application.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    async fn fetch<T: DeserializeOwned>(&self, collection: &str, id: &str) -> StoreResult<Option<T>> {
        match self.store.get(collection, id).await? {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    async fn save<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> StoreResult<()> {
        self.store.put(collection, id, &serde_json::to_string(doc)?).await
    }

    async fn create<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> StoreResult<bool> {
        self.store.insert_new(collection, id, &serde_json::to_string(doc)?).await
    }

    /// Read-modify-write that retries until no other writer got in between.
    /// `change` returns whether it modified the document; unchanged documents
    /// are not written back. Returns the stored document, or `None` when missing.
    async fn update<T, F>(&self, collection: &str, id: &str, mut change: F) -> StoreResult<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnMut(&mut T) -> bool + Send,
    {
        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let Some(current) = self.store.get(collection, id).await? else {
                return Ok(None);
            };
            let mut doc: T = serde_json::from_str(&current)?;
            if !change(&mut doc) {
                return Ok(Some(doc));
            }

            let replacement = serde_json::to_string(&doc)?;
            if self.store.compare_and_swap(collection, id, &current, &replacement).await? {
                return Ok(Some(doc));
            }
            tokio::task::yield_now().await;
        }

        tracing::warn!("Gave up updating {}:{} after {} attempts", collection, id, MAX_UPDATE_ATTEMPTS);
        Err(StoreError::Contention {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    async fn all<T: DeserializeOwned>(&self, collection: &str) -> StoreResult<Vec<T>> {
        let docs = self.store.list(collection).await?;
        let mut items = Vec::with_capacity(docs.len());
        for doc in docs {
            match serde_json::from_str(&doc) {
                Ok(item) => items.push(item),
                // One corrupt document should not hide the rest of the collection
                Err(e) => tracing::warn!("Skipping unreadable {} document: {}", collection, e),
            }
        }
        Ok(items)
    }

    // Usuarios

    pub async fn get_user(&self, id: &str) -> StoreResult<Option<Usuario>> {
        self.fetch(USUARIOS, id).await
    }

    pub async fn save_user(&self, user: &Usuario) -> StoreResult<()> {
        self.save(USUARIOS, &user.id, user).await
    }

    pub async fn delete_user(&self, id: &str) -> StoreResult<bool> {
        self.store.delete(USUARIOS, id).await
    }

    pub async fn list_users(&self) -> StoreResult<Vec<Usuario>> {
        self.all(USUARIOS).await
    }

    /// Looks a user up by email or legajo.
    pub async fn find_user_by_identifier(&self, identifier: &str) -> StoreResult<Option<Usuario>> {
        Ok(self
            .list_users()
            .await?
            .into_iter()
            .find(|u| u.matches_identifier(identifier)))
    }

    pub async fn find_user_by_legajo(&self, legajo: &str) -> StoreResult<Option<Usuario>> {
        Ok(self.list_users().await?.into_iter().find(|u| u.legajo == legajo))
    }

    pub async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<Usuario>> {
        Ok(self.list_users().await?.into_iter().find(|u| u.email == email))
    }

    /// Another user already holding this email or legajo.
    pub async fn find_conflicting_user(
        &self,
        email: &str,
        legajo: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<Option<Usuario>> {
        Ok(self.list_users().await?.into_iter().find(|u| {
            Some(u.id.as_str()) != exclude_id && (u.email == email || u.legajo == legajo)
        }))
    }

    // Clases

    pub async fn get_clase(&self, id: &str) -> StoreResult<Option<Clase>> {
        self.fetch(CLASES, id).await
    }

    pub async fn save_clase(&self, clase: &Clase) -> StoreResult<()> {
        self.save(CLASES, &clase.id, clase).await
    }

    pub async fn delete_clase(&self, id: &str) -> StoreResult<bool> {
        self.store.delete(CLASES, id).await
    }

    pub async fn list_clases(&self) -> StoreResult<Vec<Clase>> {
        self.all(CLASES).await
    }

    // Inscripciones

    pub async fn get_inscripcion(&self, id: &str) -> StoreResult<Option<Inscripcion>> {
        self.fetch(INSCRIPCIONES, id).await
    }

    /// Returns false when the id, and so the (user, class) pair, is taken.
    pub async fn create_inscripcion(&self, inscripcion: &Inscripcion) -> StoreResult<bool> {
        self.create(INSCRIPCIONES, &inscripcion.id, inscripcion).await
    }

    pub async fn list_inscripciones(&self) -> StoreResult<Vec<Inscripcion>> {
        self.all(INSCRIPCIONES).await
    }

    // Tiempo en clase

    pub async fn get_tiempo(&self, id: &str) -> StoreResult<Option<TiempoClase>> {
        self.fetch(TIEMPO_CLASE, id).await
    }

    pub async fn create_tiempo(&self, tiempo: &TiempoClase) -> StoreResult<bool> {
        self.create(TIEMPO_CLASE, &tiempo.id, tiempo).await
    }

    pub async fn save_tiempo(&self, tiempo: &TiempoClase) -> StoreResult<()> {
        self.save(TIEMPO_CLASE, &tiempo.id, tiempo).await
    }

    /// Atomic change of one time record, see [`Repository::update`].
    pub async fn update_tiempo<F>(&self, id: &str, change: F) -> StoreResult<Option<TiempoClase>>
    where
        F: FnMut(&mut TiempoClase) -> bool + Send,
    {
        self.update(TIEMPO_CLASE, id, change).await
    }

    pub async fn list_tiempos(&self) -> StoreResult<Vec<TiempoClase>> {
        self.all(TIEMPO_CLASE).await
    }

    // Solicitudes de material

    pub async fn get_solicitud(&self, id: &str) -> StoreResult<Option<SolicitudMaterial>> {
        self.fetch(SOLICITUDES, id).await
    }

    pub async fn create_solicitud(&self, solicitud: &SolicitudMaterial) -> StoreResult<bool> {
        self.create(SOLICITUDES, &solicitud.id, solicitud).await
    }

    pub async fn list_solicitudes(&self) -> StoreResult<Vec<SolicitudMaterial>> {
        self.all(SOLICITUDES).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rol;
    use crate::services::MemoryStore;
    use crate::tracker::Snapshot;
    use chrono::Utc;

    fn repo() -> Repository {
        Repository::new(Arc::new(MemoryStore::new()))
    }

    fn usuario(id: &str, email: &str, legajo: &str) -> Usuario {
        Usuario {
            id: id.into(),
            apellido_nombre: format!("Usuario {}", id),
            legajo: legajo.into(),
            turno: "Turno mañana".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Rol::User,
            fecha_registro: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_user_lookup_by_identifier() {
        let repo = repo();
        repo.save_user(&usuario("1", "a@x.com", "100")).await.unwrap();
        repo.save_user(&usuario("2", "b@x.com", "200")).await.unwrap();

        assert_eq!(repo.find_user_by_identifier("b@x.com").await.unwrap().unwrap().id, "2");
        assert_eq!(repo.find_user_by_identifier("100").await.unwrap().unwrap().id, "1");
        assert!(repo.find_user_by_identifier("300").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conflict_excludes_self() {
        let repo = repo();
        repo.save_user(&usuario("1", "a@x.com", "100")).await.unwrap();

        assert!(repo.find_conflicting_user("a@x.com", "999", Some("1")).await.unwrap().is_none());
        assert!(repo.find_conflicting_user("z@x.com", "100", Some("2")).await.unwrap().is_some());
        assert!(repo.find_conflicting_user("a@x.com", "999", None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::new(store.clone());
        repo.save_user(&usuario("1", "a@x.com", "100")).await.unwrap();
        store.put(USUARIOS, "broken", "{not json").await.unwrap();

        assert_eq!(repo.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_time_updates_are_all_kept() {
        let repo = repo();
        let now = Utc::now();
        repo.create_tiempo(&TiempoClase::new("t".into(), "u", None, "Stroke", now))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    let sesion = format!("tab-{}", i);
                    repo.update_tiempo("t", |t| {
                        t.registrar(&sesion, Snapshot::new(1, 0), true, Utc::now());
                        true
                    })
                    .await
                    .unwrap()
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_some());
        }

        let tiempo = repo.get_tiempo("t").await.unwrap().unwrap();
        assert_eq!(tiempo.sesiones.len(), 50);
        assert_eq!(tiempo.totales(), Snapshot::new(50, 0));
        assert!(!tiempo.activo);
    }

    #[tokio::test]
    async fn test_update_of_missing_document() {
        let repo = repo();
        let mut called = false;
        let result = repo
            .update_tiempo("missing", |_| {
                called = true;
                true
            })
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(!called);
    }
}
