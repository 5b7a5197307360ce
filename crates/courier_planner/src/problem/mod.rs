pub mod assignment;
pub mod route_assignment_problem;
pub mod stop;
pub mod vehicle;
