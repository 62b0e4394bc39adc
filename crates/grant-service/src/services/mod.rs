pub mod grant_service;
