use std::cmp::Ordering;

use serde::Deserialize;

use crate::{
    entities::movie,
    error::AppError,
    tmdb::MovieDetails,
};

/// Insert payload for a freshly selected movie. Rating and review are left
/// unset until the user submits the edit form.
#[derive(Clone, Debug)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub description: String,
    pub img_url: String,
}

impl NewMovie {
    /// Fails when the candidate has no release date or no poster; both are
    /// required columns on the list.
    pub fn from_details(details: &MovieDetails, image_base: &str) -> Result<Self, AppError> {
        let year = details
            .release_year()
            .ok_or(AppError::MissingExternalField("release date"))?;
        let img_url = details
            .poster_url(image_base)
            .ok_or(AppError::MissingExternalField("poster"))?;

        Ok(Self {
            title: details.title.clone(),
            year: year as i32,
            description: details.overview.clone(),
            img_url,
        })
    }
}

#[derive(Clone, Debug)]
pub struct RankedMovie {
    pub rank: usize,
    pub movie: movie::Model,
}

/// Rank 1 is the lowest-rated entry and rank == len the highest, recomputed
/// on every listing. Unrated movies sort below any rated movie; equal
/// ratings break ties by ascending id.
pub fn rank_by_rating(mut movies: Vec<movie::Model>) -> Vec<RankedMovie> {
    movies.sort_by(|a, b| match (a.rating, b.rating) {
        (None, None) => a.id.cmp(&b.id),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal).then(a.id.cmp(&b.id))
        },
    });

    movies
        .into_iter()
        .enumerate()
        .map(|(i, movie)| RankedMovie { rank: i + 1, movie })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub title: String,
}

impl AddForm {
    pub fn validated_title(&self) -> Result<&str, &'static str> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Movie title is required");
        }
        Ok(title)
    }
}

/// Fields arrive as raw strings; a bad submission re-renders the form with
/// the message from `validated`.
#[derive(Debug, Deserialize)]
pub struct EditForm {
    pub rating: String,
    pub review: String,
}

impl EditForm {
    pub fn validated(&self) -> Result<(f64, &str), &'static str> {
        let rating: f64 = self
            .rating
            .trim()
            .parse()
            .map_err(|_| "Rating must be a number")?;
        if !rating.is_finite() {
            return Err("Rating must be a number");
        }

        let review = self.review.trim();
        if review.is_empty() {
            return Err("Review is required");
        }

        Ok((rating, review))
    }
}
