/// Fields supplied at signup; tier and usage start at their defaults.
pub struct UserCreateRequest {
    pub id: String,
    pub email: String,
}
