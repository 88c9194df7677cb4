pub mod city;
pub mod result;
pub mod salary;
