pub mod fixtures;

#[cfg(test)]
mod name_resolution_tests;
#[cfg(test)]
mod dispatcher_tests;
#[cfg(test)]
mod store_tests;
#[cfg(test)]
mod api_shapes_tests;
