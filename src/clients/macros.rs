/// Generates the read-side and delete wrappers a domain client puts over a
/// [`crate::cache::CacheClient`], mapping framework errors into `$error`.
///
/// `$error` must implement `From<CacheError>` and have a `NotFound(String)`
/// variant.
#[macro_export]
macro_rules! impl_client_methods {
    ($client_name:ident, $entity:ty, $error:ty, $entity_name_snake:ident, $plural_snake:ident) => {
        paste::paste! {
            impl $client_name {
                #[tracing::instrument(skip(self))]
                pub async fn [<list_ $plural_snake>](&self) -> Result<std::sync::Arc<Vec<$entity>>, $error> {
                    tracing::debug!("Sending request");
                    self.inner.read().await.map_err(<$error>::from)
                }

                /// Cached collection without triggering a fetch.
                #[tracing::instrument(skip(self))]
                pub async fn [<peek_ $plural_snake>](&self) -> Result<Option<std::sync::Arc<Vec<$entity>>>, $error> {
                    self.inner.peek().await.map_err(<$error>::from)
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<refresh_ $plural_snake>](&self) -> Result<(), $error> {
                    tracing::debug!("Sending request");
                    self.inner.invalidate().await.map_err(<$error>::from)
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $entity_name_snake>](&self, id: String) -> Result<$entity, $error> {
                    tracing::debug!("Sending request");
                    let all = self.[<list_ $plural_snake>]().await?;
                    all.iter()
                        .find(|e| $crate::cache::Entity::id(*e) == &id)
                        .cloned()
                        .ok_or(<$error>::NotFound(id))
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<delete_ $entity_name_snake>](
                    &self,
                    id: String,
                ) -> Result<$crate::cache::Pending<()>, $error> {
                    tracing::debug!("Sending request");
                    self.inner.delete(id).await.map_err(<$error>::from)
                }

                pub fn subscribe(&self) -> tokio::sync::watch::Receiver<$crate::cache::CacheView<$entity>> {
                    self.inner.subscribe()
                }

                pub fn events(&self) -> tokio::sync::broadcast::Receiver<$crate::cache::CacheEvent<$entity>> {
                    self.inner.events()
                }
            }
        }
    };
}

#[macro_export]
macro_rules! impl_client_new {
    ($client_name:ident, $entity:ty) => {
        impl $client_name {
            pub fn new(inner: $crate::cache::CacheClient<$entity>) -> Self {
                Self { inner }
            }
        }
    };
}

#[macro_export]
macro_rules! impl_basic_client {
    ($client_name:ident, $entity:ty, $error:ty, $entity_name_snake:ident, $plural_snake:ident) => {
        $crate::impl_client_new!($client_name, $entity);
        $crate::impl_client_methods!($client_name, $entity, $error, $entity_name_snake, $plural_snake);
    };
}
