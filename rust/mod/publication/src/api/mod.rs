mod comments;
mod media;
mod publications;
mod users;

use std::sync::Arc;

use axum::Router;

use crate::service::PublicationService;

type ServiceState = Arc<PublicationService>;

/// Build the complete publication module router.
///
/// Routes:
/// - `POST   /publications`                                   - create publication
/// - `GET    /publications?since=`                            - list publications
/// - `GET    /publications/{id}`                              - get publication
/// - `DELETE /publications/{id}`                              - delete publication
/// - `POST   /publications/{id}/@like`                        - like once per user
/// - `POST   /publications/{id}/@unlike`                      - withdraw like
/// - `GET    /publications/{id}/likes/{user}`                 - like status
/// - `POST   /publications/{id}/@upvote`, `@downvote`         - raw vote
/// - `POST   /publications/{id}/media`                        - upload media
/// - `POST   /publications/{id}/comments`                     - add comment
/// - `DELETE /publications/{id}/comments/{cid}`               - delete comment
/// - `POST   /publications/{id}/comments/{cid}/@upvote`, `@downvote`
/// - `POST   /publications/{id}/comments/{cid}/replies`       - add reply
/// - `DELETE /publications/{id}/comments/{cid}/replies/{rid}` - delete reply
/// - `POST   /publications/{id}/comments/{cid}/replies/{rid}/@upvote`, `@downvote`
/// - `GET    /users/{user}/publications`                      - by user
/// - `DELETE /users/{user}/publications`                      - delete all of user
/// - `GET    /users/{user}/liked`                             - liked by user
/// - `GET    /images/{id}`                                    - media bytes
/// - `GET    /trending`                                       - ranked publications
pub fn router(service: Arc<PublicationService>) -> Router {
    Router::new()
        .merge(publications::router(Arc::clone(&service)))
        .merge(comments::router(Arc::clone(&service)))
        .merge(media::router(Arc::clone(&service)))
        .merge(users::router(service))
}
