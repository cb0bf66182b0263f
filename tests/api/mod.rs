mod auth_tests;
mod catalogue_tests;
mod enrollment_tests;
mod health_tests;
