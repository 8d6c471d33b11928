use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::NewMovie,
};

/// CRUD access to the movie table. Rank is not a store concern; callers
/// compute it from `list_all`.
#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_all(&self) -> AppResult<Vec<movie::Model>> {
        Ok(movie::Entity::find().order_by_asc(movie::Column::Id).all(&self.db).await?)
    }

    pub async fn get(&self, id: i32) -> AppResult<movie::Model> {
        movie::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::MovieNotFound(id))
    }

    pub async fn insert(&self, new: NewMovie) -> AppResult<movie::Model> {
        let model = movie::ActiveModel {
            title: Set(new.title),
            year: Set(new.year),
            description: Set(new.description),
            img_url: Set(new.img_url),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?)
    }

    pub async fn update_review(
        &self,
        id: i32,
        rating: f64,
        review: String,
    ) -> AppResult<movie::Model> {
        let mut active: movie::ActiveModel = self.get(id).await?.into();
        active.rating = Set(Some(rating));
        active.review = Set(Some(review));
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let res = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::MovieNotFound(id));
        }
        Ok(())
    }
}
