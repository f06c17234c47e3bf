use std::sync::Arc;

use axum::{
    extract::{rejection::{FormRejection, JsonRejection}, Extension, Form, Multipart, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;
use uuid::Uuid;

use petstore_infra::storage::IMAGES_BUCKET;
use petstore_pets::PetStatus;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

const PET_NOT_FOUND: &str = "Pet not found";
const ALLOWED_IMAGE_TYPES: [(&str, &str); 2] = [("image/jpeg", "jpg"), ("image/png", "png")];

pub async fn create_pet(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::PetRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return errors::json_error(StatusCode::METHOD_NOT_ALLOWED, "Invalid input");
    };
    let pet = match body.into_pet() {
        Ok(pet) => pet,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.pets.create(pet).await {
        Ok(pet) => {
            info!(pet_id = pet.id, "pet created");
            (StatusCode::CREATED, Json(pet)).into_response()
        }
        Err(e) => errors::repo_error_to_response(e, PET_NOT_FOUND),
    }
}

pub async fn update_pet(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::PetRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return errors::json_error(StatusCode::METHOD_NOT_ALLOWED, "Validation exception");
    };
    if body.id < 1 {
        return errors::invalid_id();
    }
    let pet = match body.into_pet() {
        Ok(pet) => pet,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.pets.update(pet).await {
        Ok(pet) => Json(pet).into_response(),
        Err(e) => errors::repo_error_to_response(e, PET_NOT_FOUND),
    }
}

pub async fn get_pet(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = dto::parse_id(&id) else {
        return errors::invalid_id();
    };
    match services.pets.find_by_id(id).await {
        Ok(pet) => Json(pet).into_response(),
        Err(e) => errors::repo_error_to_response(e, PET_NOT_FOUND),
    }
}

pub async fn find_by_status(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::StatusQuery>,
) -> Response {
    let Some(Ok(status)) = query.status.as_deref().map(str::parse::<PetStatus>) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "Invalid status value");
    };
    match services.pets.find_by_status(status).await {
        Ok(pets) => Json(pets).into_response(),
        Err(e) => errors::repo_error_to_response(e, PET_NOT_FOUND),
    }
}

/// `?tags=a&tags=b`: pets carrying every listed tag.
pub async fn find_by_tags(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let tags: Vec<String> = params
        .into_iter()
        .filter(|(key, _)| key == "tags")
        .map(|(_, value)| value)
        .collect();
    if tags.is_empty() || tags.iter().any(|t| t.trim().is_empty()) {
        return errors::json_error(StatusCode::BAD_REQUEST, "Invalid tag value");
    }
    match services.pets.find_by_tags(&tags).await {
        Ok(pets) => Json(pets).into_response(),
        Err(e) => errors::repo_error_to_response(e, PET_NOT_FOUND),
    }
}

pub async fn update_pet_with_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    form: Result<Form<dto::PetForm>, FormRejection>,
) -> Response {
    let Ok(id) = dto::parse_id(&id) else {
        return errors::invalid_id();
    };
    let Ok(Form(form)) = form else {
        return errors::json_error(StatusCode::METHOD_NOT_ALLOWED, "Invalid input");
    };
    let mut pet = match services.pets.find_by_id(id).await {
        Ok(pet) => pet,
        Err(e) => return errors::repo_error_to_response(e, PET_NOT_FOUND),
    };

    if let Some(name) = form.name.filter(|n| !n.trim().is_empty()) {
        pet.name = name;
    }
    if let Some(status) = form.status.filter(|s| !s.is_empty()) {
        match status.parse() {
            Ok(status) => pet.status = status,
            Err(e) => return errors::domain_error_to_response(e),
        }
    }

    match services.pets.update(pet).await {
        Ok(pet) => Json(pet).into_response(),
        Err(e) => errors::repo_error_to_response(e, PET_NOT_FOUND),
    }
}

pub async fn delete_pet(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = dto::parse_id(&id) else {
        return errors::invalid_id();
    };
    match services.pets.delete(id).await {
        Ok(()) => {
            info!(pet_id = id, "pet deleted");
            errors::api_response(StatusCode::OK, "Pet deleted")
        }
        Err(e) => errors::repo_error_to_response(e, PET_NOT_FOUND),
    }
}

/// Multipart field `file` (jpeg or png) is stored in the `images` bucket under
/// a random name and its link appended to the pet's photo URLs.
pub async fn upload_image(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let Ok(id) = dto::parse_id(&id) else {
        return errors::invalid_id();
    };
    let mut pet = match services.pets.find_by_id(id).await {
        Ok(pet) => pet,
        Err(e) => return errors::repo_error_to_response(e, PET_NOT_FOUND),
    };

    let (content_type, bytes) = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => break (content_type, bytes),
                    Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, e.body_text()),
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => return errors::json_error(StatusCode::BAD_REQUEST, "file is required"),
            Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, e.body_text()),
        }
    };

    let Some((_, extension)) = ALLOWED_IMAGE_TYPES.iter().find(|(mime, _)| *mime == content_type) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "only image/jpeg and image/png are allowed");
    };
    let filename = format!("{}.{extension}", Uuid::now_v7().simple());

    let temp = match tempfile::NamedTempFile::new() {
        Ok(temp) => temp,
        Err(e) => return errors::server_error(e),
    };
    if let Err(e) = tokio::fs::write(temp.path(), &bytes).await {
        return errors::server_error(e);
    }
    let saved = services
        .storage
        .save(IMAGES_BUCKET, &filename, &content_type, temp.path())
        .await;
    drop(temp);
    if let Err(e) = saved {
        return errors::storage_error_to_response(e);
    }

    let link = match services.storage.get_link(IMAGES_BUCKET, &filename).await {
        Ok(link) => link,
        Err(e) => return errors::storage_error_to_response(e),
    };
    pet.add_photo_url(link);

    match services.pets.update(pet).await {
        Ok(_) => {
            info!(pet_id = id, %filename, "pet image uploaded");
            errors::api_response(StatusCode::OK, "Success upload")
        }
        Err(e) => errors::repo_error_to_response(e, PET_NOT_FOUND),
    }
}
